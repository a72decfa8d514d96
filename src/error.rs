//! Structured error kinds surfaced by the core (see `SPEC_FULL.md` §7).
//!
//! Serialization failures carry a JSON-pointer-style `path` so callers can
//! locate the offending field; everything else is a plain contract
//! violation returned to the caller rather than panicking.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cyber system is not initialised")]
    NotInitialised,
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
    #[error("unknown goal: {0}")]
    UnknownGoal(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("type already defined: {0}")]
    TypeAlreadyDefined(String),
    #[error("episode already stored")]
    Duplicate,
    #[error("serialization error at {path}: {source}")]
    SerializationError {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
