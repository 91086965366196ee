use thiserror::Error;

/// Error type shared by every operation in the workspace.
///
/// Variants carry the name of the failing operation plus enough structured
/// context to reconstruct what went wrong without a debugger attached.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("Shape mismatch in operation '{operation}': expected {expected}, got {got}")]
    ShapeMismatch {
        operation: String,
        expected: String,
        got: String,
    },

    #[error("Invalid shape in operation '{operation}': {reason}")]
    InvalidShape {
        operation: String,
        reason: String,
        shape: Option<Vec<usize>>,
    },

    #[error("Invalid axis {axis} in operation '{operation}' for tensor with {ndim} dimensions")]
    InvalidAxis {
        operation: String,
        axis: i64,
        ndim: usize,
    },

    #[error("Invalid argument in operation '{operation}': {reason}")]
    InvalidArgument { operation: String, reason: String },

    #[error("Operation '{operation}' not supported: {reason}")]
    UnsupportedOperation { operation: String, reason: String },
}

impl TensorError {
    pub fn shape_mismatch(
        operation: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self::ShapeMismatch {
            operation: operation.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn invalid_shape(
        operation: impl Into<String>,
        reason: impl Into<String>,
        shape: Option<Vec<usize>>,
    ) -> Self {
        Self::InvalidShape {
            operation: operation.into(),
            reason: reason.into(),
            shape,
        }
    }

    /// Shortcut for the common case where only a message is useful.
    pub fn invalid_shape_simple(reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            operation: "unknown".to_string(),
            reason: reason.into(),
            shape: None,
        }
    }

    pub fn invalid_argument(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_operation(
        operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TensorError>;
