use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// License metadata as reported by GitHub for a repository.
///
/// A repository without a declared license decodes to the default (all-empty)
/// descriptor rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseDescriptor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// `null` for GitHub's catch-all `other` license.
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spdx_id: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl LicenseDescriptor {
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.name.is_empty()
    }
}

/// The step of a resolution task that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveStage {
    FetchSourceUrl,
    ParseSourceUrl,
    FetchLicense,
}

impl ResolveStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveStage::FetchSourceUrl => "fetch source URL",
            ResolveStage::ParseSourceUrl => "parse source URL",
            ResolveStage::FetchLicense => "fetch license",
        }
    }
}

impl std::fmt::Display for ResolveStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either the resolved license or a placeholder naming the failed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseResult {
    License(LicenseDescriptor),
    Error(ResolveStage),
}

impl LicenseResult {
    pub const ERROR_KEY: &'static str = "error";

    pub fn key(&self) -> &str {
        match self {
            LicenseResult::License(d) => &d.key,
            LicenseResult::Error(_) => Self::ERROR_KEY,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LicenseResult::License(d) => &d.name,
            LicenseResult::Error(stage) => stage.as_str(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LicenseResult::Error(_))
    }
}

// Placeholders serialize in the same `{key, name}` shape as descriptors.
impl Serialize for LicenseResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LicenseResult::License(d) => d.serialize(serializer),
            LicenseResult::Error(stage) => {
                let mut s = serializer.serialize_struct("LicenseResult", 2)?;
                s.serialize_field("key", Self::ERROR_KEY)?;
                s.serialize_field("name", stage.as_str())?;
                s.end()
            }
        }
    }
}

/// One resolved (or failed) dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyOutcome {
    pub name: String,
    pub license: LicenseResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LicenseRisk {
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
    Proprietary,
    Unknown,
}

impl std::fmt::Display for LicenseRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseRisk::Permissive => write!(f, "Permissive"),
            LicenseRisk::WeakCopyleft => write!(f, "Weak Copyleft"),
            LicenseRisk::StrongCopyleft => write!(f, "Strong Copyleft"),
            LicenseRisk::Proprietary => write!(f, "Proprietary"),
            LicenseRisk::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyVerdict {
    Pass,
    Warn,
    Error,
}

impl std::fmt::Display for PolicyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyVerdict::Pass => write!(f, "pass"),
            PolicyVerdict::Warn => write!(f, "warn"),
            PolicyVerdict::Error => write!(f, "error"),
        }
    }
}

/// A dependency outcome after classification and policy evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub license: LicenseResult,
    pub risk: LicenseRisk,
    pub verdict: PolicyVerdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_placeholder_shape() {
        let result = LicenseResult::Error(ResolveStage::ParseSourceUrl);
        assert_eq!(result.key(), "error");
        assert_eq!(result.name(), "parse source URL");

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "key": "error", "name": "parse source URL" })
        );
    }

    #[test]
    fn test_descriptor_serializes_without_spdx_when_absent() {
        let result = LicenseResult::License(LicenseDescriptor {
            key: "mit".into(),
            name: "MIT License".into(),
            url: "https://api.github.com/licenses/mit".into(),
            spdx_id: None,
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["key"], "mit");
        assert!(json.get("spdx_id").is_none());
    }

    #[test]
    fn test_github_other_license_with_null_fields() {
        let d: LicenseDescriptor = serde_json::from_value(serde_json::json!({
            "key": "other",
            "name": "Other",
            "spdx_id": "NOASSERTION",
            "url": null
        }))
        .unwrap();
        assert_eq!(d.key, "other");
        assert_eq!(d.url, "");
    }

    #[test]
    fn test_default_descriptor_is_empty() {
        assert!(LicenseDescriptor::default().is_empty());
    }
}
