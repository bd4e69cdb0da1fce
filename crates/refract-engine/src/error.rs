//! Error types for the reflection engine

use refract_sdk::{MemberKind, SdkError};

/// Result type for engine operations
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Errors raised by lookup, matching, and dispatch
#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    /// No loader strategy could resolve the name
    #[error("Type not found: {name}")]
    TypeNotFound {
        /// Requested type name
        name: String,
    },

    /// A required collaborator was not supplied
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// Lookup found no member passing the filter
    #[error("No {kind} {filter} in {type_name}")]
    MemberNotFound {
        /// Member kind searched for
        kind: MemberKind,
        /// Filter description
        filter: String,
        /// Type the walk started from
        type_name: String,
    },

    /// No member passed the filter and accepted the call arguments
    #[error("No {kind} {filter} in {type_name} callable with {signature}")]
    NoSuchCallable {
        /// Member kind searched for
        kind: MemberKind,
        /// Filter description
        filter: String,
        /// Type the walk started from
        type_name: String,
        /// Runtime argument signature, e.g. `(Integer,null)`
        signature: String,
    },

    /// The invoked member failed while executing
    #[error("{member} failed: {message}")]
    InvocationFailure {
        /// Member description
        member: String,
        /// Failure raised by the member body
        message: String,
    },

    /// The runtime refused access to a member
    #[error("Illegal access to {member}: {reason}")]
    AccessViolation {
        /// Member description
        member: String,
        /// Why access was refused
        reason: String,
    },

    /// A value or receiver did not fit the member
    #[error("Illegal value for {member}: {reason}")]
    IllegalValue {
        /// Member description
        member: String,
        /// What did not fit
        reason: String,
    },

    /// The permission store denied the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A filter name pattern failed to compile
    #[error("Invalid name pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Regex compile error
        #[source]
        source: regex::Error,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A type definition was rejected by the registry
    #[error("Registry error: {0}")]
    Registry(String),
}

impl From<SdkError> for ReflectError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::TypeNotFound(name) => ReflectError::TypeNotFound { name },
            SdkError::AccessViolation { member, reason } => {
                ReflectError::AccessViolation { member, reason }
            }
            SdkError::IllegalValue { member, reason } => ReflectError::IllegalValue { member, reason },
            SdkError::InvocationFailure { member, message } => {
                ReflectError::InvocationFailure { member, message }
            }
            SdkError::InvalidDefinition(msg) => ReflectError::Registry(msg),
        }
    }
}
