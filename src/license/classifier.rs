use crate::models::{LicenseResult, LicenseRisk};

use super::license_id;

/// Classify a resolved license into a risk level.
pub fn classify(result: &LicenseResult) -> LicenseRisk {
    classify_id(license_id(result))
}

/// Classify a single SPDX identifier or GitHub license key, ignoring case.
pub fn classify_id(id: &str) -> LicenseRisk {
    let lower = id.trim().to_ascii_lowercase();

    if lower.contains("proprietary") || lower.contains("commercial") {
        return LicenseRisk::Proprietary;
    }

    match lower.as_str() {
        "mit" | "mit-0" | "apache-2.0" | "bsd-2-clause" | "bsd-3-clause" | "bsd-3-clause-clear"
        | "bsd-4-clause" | "isc" | "0bsd" | "unlicense" | "zlib" | "cc0-1.0" | "wtfpl"
        | "cc-by-4.0" | "bsl-1.0" | "ncsa" | "postgresql" | "python-2.0" | "blueoak-1.0.0"
        | "artistic-2.0" => LicenseRisk::Permissive,

        "lgpl-2.1" | "lgpl-2.1-only" | "lgpl-2.1-or-later" | "lgpl-3.0" | "lgpl-3.0-only"
        | "lgpl-3.0-or-later" | "mpl-2.0" | "epl-1.0" | "epl-2.0" | "eupl-1.2" | "cddl-1.0"
        | "osl-3.0" => LicenseRisk::WeakCopyleft,

        "gpl-2.0" | "gpl-2.0-only" | "gpl-2.0-or-later" | "gpl-3.0" | "gpl-3.0-only"
        | "gpl-3.0-or-later" | "agpl-3.0" | "agpl-3.0-only" | "agpl-3.0-or-later"
        | "eupl-1.1" => LicenseRisk::StrongCopyleft,

        _ => LicenseRisk::Unknown,
    }
}
