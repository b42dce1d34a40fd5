use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the weight engine.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// The caller supplied an out-of-domain value.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("assignment {0} is not part of this hike")]
    AssignmentNotFound(Uuid),

    /// An assignment points at gear that no longer exists. Recovered inside
    /// the aggregator with a zero-weight placeholder.
    #[error("assignment {assignment_id} references missing gear {gear_id}")]
    DanglingReference { assignment_id: Uuid, gear_id: Uuid },
}

impl CoreError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
