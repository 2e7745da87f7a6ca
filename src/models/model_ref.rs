use crate::error::{Result, ToonifyError};
use std::fmt;
use std::str::FromStr;

/// Which vendor model (and optionally which version of it) runs a prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReference {
    OwnerName {
        owner: String,
        name: String,
        version: Option<String>,
    },
    Version(String),
}

impl ModelReference {
    /// Parses `owner/name`, `owner/name:version` or a bare version id.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ToonifyError::ConfigError(
                "Missing REPLICATE_MODEL".to_string(),
            ));
        }

        match raw.split_once('/') {
            Some((owner, rest)) => {
                let (name, version) = match rest.split_once(':') {
                    Some((name, version)) => (name, Some(version)),
                    None => (rest, None),
                };
                if owner.is_empty() || name.is_empty() {
                    return Err(ToonifyError::ConfigError(format!(
                        "Malformed model reference '{}'",
                        raw
                    )));
                }
                Ok(ModelReference::OwnerName {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    version: version.filter(|v| !v.is_empty()).map(String::from),
                })
            }
            None => Ok(ModelReference::Version(raw.to_string())),
        }
    }

    /// The explicit version if one is known without asking the vendor.
    pub fn explicit_version(&self) -> Option<&str> {
        match self {
            ModelReference::OwnerName { version, .. } => version.as_deref(),
            ModelReference::Version(version) => Some(version),
        }
    }
}

impl FromStr for ModelReference {
    type Err = ToonifyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelReference::OwnerName {
                owner,
                name,
                version: Some(version),
            } => write!(f, "{}/{}:{}", owner, name, version),
            ModelReference::OwnerName { owner, name, .. } => write!(f, "{}/{}", owner, name),
            ModelReference::Version(version) => write!(f, "{}", version),
        }
    }
}
