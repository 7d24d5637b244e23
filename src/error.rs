use thiserror::Error;

/// The two ways a build can fail. A failed build never returns a partially
/// populated model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The dataset lacks a required entry, or a value violates the domain
    /// declared for its parameter.
    #[error("schema validation failed for `{param}`: {reason}")]
    Schema { param: String, reason: String },
    /// A derived set or constraint references an index outside its governing
    /// set. This indicates a template bug rather than a data bug.
    #[error("structural inconsistency in `{context}`: {reason}")]
    Structural { context: String, reason: String },
}

impl BuildError {
    /// A required key is absent from the dataset.
    pub fn missing(param: &str, key: impl std::fmt::Display) -> Self {
        BuildError::Schema {
            param: param.to_string(),
            reason: format!("missing entry for key {}", key),
        }
    }

    /// A value is present but outside the parameter's domain.
    pub fn domain(
        param: &str,
        key: impl std::fmt::Display,
        value: impl std::fmt::Display,
        expected: &str,
    ) -> Self {
        BuildError::Schema {
            param: param.to_string(),
            reason: format!("value {} for key {} is not {}", value, key, expected),
        }
    }

    /// A key appears more than once where the schema requires it to be unique.
    pub fn duplicate(param: &str, key: impl std::fmt::Display) -> Self {
        BuildError::Schema {
            param: param.to_string(),
            reason: format!("duplicate entry for key {}", key),
        }
    }

    pub fn structural(context: &str, reason: impl Into<String>) -> Self {
        BuildError::Structural {
            context: context.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
