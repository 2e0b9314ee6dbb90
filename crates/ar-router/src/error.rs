//! Routing error kinds.
//!
//! Every per-span error is absorbed by the controller: escalation to the
//! next cascade tier, or an explicit unresolved entry once all tiers fail.

use ar_protocol::CallSource;
use thiserror::Error;

use crate::inference::InferenceError;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("segmentation ambiguous: {0}")]
    SegmentationAmbiguous(String),

    #[error("no tool scored above the keyword threshold (best {best:.2})")]
    SelectionLowConfidence { best: f64 },

    #[error("no tool selected for span")]
    NoToolSelected,

    #[error("{tool}: missing required argument(s): {}", args.join(", "))]
    ExtractionMissingArg { tool: String, args: Vec<String> },

    #[error("{tool}: argument(s) not coercible to declared type: {}", args.join(", "))]
    ExtractionInvalidType { tool: String, args: Vec<String> },

    #[error("{tool}: argument(s) violate constraints: {}", args.join(", "))]
    ExtractionConstraintViolation { tool: String, args: Vec<String> },

    #[error("{tier} confidence {confidence:.2} below threshold")]
    ExtractionLowConfidence { tier: CallSource, confidence: f64 },

    #[error("{tier} tier returned no usable call")]
    NoUsableCall { tier: CallSource },

    #[error("local model error: {0}")]
    LocalModel(#[from] InferenceError),

    #[error("cloud model timed out after {timeout_ms}ms")]
    CloudTimeout { timeout_ms: u64 },

    #[error("cloud model unavailable: {0}")]
    CloudUnavailable(String),

    #[error("all tiers failed: {0}")]
    UnresolvedSpan(String),
}

impl RouteError {
    /// Argument names behind a validation failure, if this is one.
    pub fn failing_args(&self) -> Option<&[String]> {
        match self {
            Self::ExtractionMissingArg { args, .. }
            | Self::ExtractionInvalidType { args, .. }
            | Self::ExtractionConstraintViolation { args, .. } => Some(args),
            _ => None,
        }
    }

    /// Whether this error came from the validator.
    pub fn is_validation(&self) -> bool {
        self.failing_args().is_some()
    }
}

/// Convenience alias for routing results.
pub type RouteResult<T> = Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_arg_message_lists_names() {
        let err = RouteError::ExtractionMissingArg {
            tool: "send_message".into(),
            args: vec!["recipient".into(), "message".into()],
        };
        assert_eq!(
            err.to_string(),
            "send_message: missing required argument(s): recipient, message"
        );
        assert_eq!(err.failing_args().unwrap().len(), 2);
        assert!(err.is_validation());
    }

    #[test]
    fn transport_errors_have_no_failing_args() {
        let err = RouteError::CloudTimeout { timeout_ms: 5000 };
        assert!(err.failing_args().is_none());
        assert_eq!(err.to_string(), "cloud model timed out after 5000ms");
    }

    #[test]
    fn low_confidence_names_source() {
        let err = RouteError::ExtractionLowConfidence {
            tier: CallSource::LocalModel,
            confidence: 0.1,
        };
        assert_eq!(err.to_string(), "local_model confidence 0.10 below threshold");
    }
}
