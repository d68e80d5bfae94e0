//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// These are the fatal/validation class of errors: they abort the enclosing
/// command immediately and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No models configured for the ensemble")]
    NoModels,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Unknown consensus strategy: {0}")]
    UnknownStrategy(String),

    #[error("Unknown evaluator kind: {0}")]
    UnknownEvaluator(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_strategy_display() {
        let error = DomainError::UnknownStrategy("borda".to_string());
        assert_eq!(error.to_string(), "Unknown consensus strategy: borda");
    }

    #[test]
    fn test_no_models_display() {
        assert_eq!(
            DomainError::NoModels.to_string(),
            "No models configured for the ensemble"
        );
    }
}
