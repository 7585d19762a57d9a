//! Resource path validation.

use crate::rpc::types::{SdkError, SdkResult};

/// Decides whether a resource path is well formed.
pub trait PathValidator: Send + Sync {
    fn validate(&self, path: &str) -> SdkResult<()>;
}

/// `zone.chain.resource`: three non-empty segments of `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPathValidator;

impl DefaultPathValidator {
    pub const SEGMENTS: usize = 3;
}

impl PathValidator for DefaultPathValidator {
    fn validate(&self, path: &str) -> SdkResult<()> {
        if path.is_empty() {
            return Err(SdkError::configuration("Path not set"));
        }

        let segments: Vec<&str> = path.split('.').collect();
        if segments.len() != Self::SEGMENTS {
            return Err(SdkError::configuration(format!(
                "Invalid path '{}': expected zone.chain.resource",
                path
            )));
        }

        for segment in segments {
            let valid = !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !valid {
                return Err(SdkError::configuration(format!(
                    "Invalid path '{}': bad segment '{}'",
                    path, segment
                )));
            }
        }
        Ok(())
    }
}
