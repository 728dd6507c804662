//! Engine errors.

use thiserror::Error;

/// Result type for engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by the engine's automation interface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The session could not be created (missing installation, licensing, ...).
    #[error("Engine session unavailable: {message}")]
    SessionUnavailable { message: String },

    #[error("Unknown compound: {name}")]
    UnknownCompound { name: String },

    #[error("Compound already registered: {name}")]
    DuplicateCompound { name: String },

    #[error("Unknown property package: {name}")]
    UnknownPropertyPackage { name: String },

    #[error("Unknown object: {tag}")]
    UnknownObject { tag: String },

    #[error("Object tag already in use: {tag}")]
    DuplicateObject { tag: String },

    #[error("Invalid value for {property} on {tag}: {reason}")]
    InvalidProperty {
        tag: String,
        property: String,
        reason: String,
    },

    #[error("Property {property} is not available on {tag}")]
    PropertyUnavailable { tag: String, property: String },

    #[error("Invalid connection {from} -> {to}: {reason}")]
    InvalidConnection {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Invalid reaction {name}: {reason}")]
    InvalidReaction { name: String, reason: String },

    /// The flowsheet could not be solved.
    #[error("Solve failed: {message}")]
    SolveFailed { message: String },

    /// Anything else the backend reports verbatim.
    #[error("Backend error: {message}")]
    Backend { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EngineError::UnknownCompound {
            name: "Unobtainium".into(),
        };
        assert!(err.to_string().contains("Unobtainium"));

        let err = EngineError::SolveFailed {
            message: "column did not converge".into(),
        };
        assert!(err.to_string().contains("did not converge"));
    }
}
