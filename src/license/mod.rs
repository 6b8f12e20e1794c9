//! Risk classification of resolved licenses.
//!
//! GitHub reports a lowercase `key` (`"apache-2.0"`) plus an `spdx_id`
//! (`"Apache-2.0"`, or `"NOASSERTION"` when it could not tell). [`license_id`]
//! picks the identifier used for both classification and policy lookup.

pub mod classifier;

use crate::models::LicenseResult;

/// Identifier used for unresolved or undeclared licenses.
pub const UNKNOWN: &str = "unknown";

const NO_ASSERTION: &str = "NOASSERTION";

/// The best identifier for a license result: SPDX id, then GitHub key, then `unknown`.
pub fn license_id(result: &LicenseResult) -> &str {
    let descriptor = match result {
        LicenseResult::License(d) => d,
        LicenseResult::Error(_) => return UNKNOWN,
    };

    descriptor
        .spdx_id
        .as_deref()
        .filter(|id| !id.is_empty() && *id != NO_ASSERTION)
        .or_else(|| Some(descriptor.key.as_str()).filter(|key| !key.is_empty()))
        .unwrap_or(UNKNOWN)
}
