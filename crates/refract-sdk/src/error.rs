//! Error types raised at the runtime primitive boundary

/// Result type for runtime primitives
pub type SdkResult<T> = Result<T, SdkError>;

/// Failures reported by a host runtime's get/set/invoke/construct primitives
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SdkError {
    /// The loader could not resolve a type name
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// The runtime refused access to a member
    #[error("Illegal access to {member}: {reason}")]
    AccessViolation {
        /// Member description
        member: String,
        /// Why access was refused
        reason: String,
    },

    /// A value or receiver did not fit the member's declared types
    #[error("Illegal value for {member}: {reason}")]
    IllegalValue {
        /// Member description
        member: String,
        /// What did not fit
        reason: String,
    },

    /// The invoked member itself failed while executing
    #[error("{member} failed: {message}")]
    InvocationFailure {
        /// Member description
        member: String,
        /// Failure raised by the member body
        message: String,
    },

    /// A member or type definition violates the object model
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),
}

impl SdkError {
    /// Build an access violation for a member
    pub fn access(member: impl ToString, reason: impl Into<String>) -> Self {
        SdkError::AccessViolation {
            member: member.to_string(),
            reason: reason.into(),
        }
    }

    /// Build an illegal value error for a member
    pub fn illegal(member: impl ToString, reason: impl Into<String>) -> Self {
        SdkError::IllegalValue {
            member: member.to_string(),
            reason: reason.into(),
        }
    }
}
