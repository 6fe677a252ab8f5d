//! Error types for the engine crate.
//!
//! None of these ever reach the player. Collaborator failures are turned
//! into fallback lines at the dialogue boundary, registry misses degrade to
//! no-ops inside the engine, and config errors surface only at load time.

use crate::maps::MapId;

/// Failure reported by a dialogue/speech collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// No backend configured, or no network/credentials.
    #[error("collaborator unavailable")]
    Unavailable,

    #[error("collaborator timed out")]
    Timeout,

    /// The backend answered with an error (quota, bad request, ...).
    #[error("collaborator rejected request: {0}")]
    Rejected(String),

    #[error("collaborator returned an empty response")]
    EmptyResponse,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Lookup failures against the map registry or an entity store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("unknown map: {0}")]
    UnknownMap(MapId),

    #[error("entity `{id}` not found on map {map}")]
    UnknownEntity { map: MapId, id: String },
}
