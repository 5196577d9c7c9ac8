use thiserror::Error;

pub type DecisionResult<T> = Result<T, DecisionError>;

#[derive(Error, Debug)]
pub enum DecisionError {
    #[error("Missing required field(s): {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DecisionError {
    /// True for errors the caller caused and can fix (4xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(self, DecisionError::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_fields() {
        let err = DecisionError::Validation {
            missing: vec!["request_id".into(), "placement".into()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required field(s): request_id, placement"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_internal_and_config_errors_are_not_client_errors() {
        let internal: DecisionError = anyhow::anyhow!("store unreachable").into();
        assert!(!internal.is_client_error());
        assert!(!DecisionError::Config("bad relevance weight".into()).is_client_error());
    }
}
