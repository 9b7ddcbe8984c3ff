//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants
//! describe broken configuration tables. Placement infeasibility and degenerate grids are not
//! errors; they degrade to partial or empty compositions.
use thiserror::Error;

use crate::catalog::{ConditionKind, ShapeId};

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("kind '{kind}' has no variants")]
    EmptyCatalog { kind: ConditionKind },

    #[error("no band configured for shape '{shape}'")]
    MissingBand { shape: ShapeId },

    #[error("no meta configured for shape '{shape}'")]
    MissingMeta { shape: ShapeId },

    #[error("shape '{shape}' appears more than once in the catalog of kind '{kind}'")]
    DuplicateVariant { kind: ConditionKind, shape: ShapeId },

    #[error("curve has no anchors: {0}")]
    EmptyCurve(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn config_errors_name_the_offender() {
        let err = Error::EmptyCatalog {
            kind: ConditionKind::Rainy,
        };
        assert_eq!(err.to_string(), "kind 'rainy' has no variants");

        let err = Error::MissingBand {
            shape: ShapeId::StormCloud,
        };
        assert_eq!(err.to_string(), "no band configured for shape 'storm_cloud'");
    }
}
