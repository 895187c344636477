// crates/launchpad-core/src/error.rs

use thiserror::Error;

/// Error taxonomy shared by every Launchpad crate.
///
/// The boundary layer maps each variant to a response through [`ReleaseError::kind`];
/// the core never decides how an error is presented.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// Unknown channel, version, or artifact.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The transition is not allowed from the current catalog state
    /// (e.g. deleting the active release).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Rejected input: empty version token, disallowed artifact format, empty payload.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage read/write failure.
    #[error("I/O failure: {0}")]
    Io(String),

    /// Concurrent-write detection. Reserved; the per-channel lock makes it unreachable today.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The authorization predicate injected by the boundary returned false.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ReleaseError {
    /// Stable machine-readable code for this error, used in RPC envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            ReleaseError::NotFound(_) => "not_found",
            ReleaseError::InvalidState(_) => "invalid_state",
            ReleaseError::InvalidInput(_) => "invalid_input",
            ReleaseError::Io(_) => "io_failure",
            ReleaseError::Conflict(_) => "conflict",
            ReleaseError::Unauthorized(_) => "unauthorized",
        }
    }
}

impl From<std::io::Error> for ReleaseError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => ReleaseError::NotFound(e.to_string()),
            _ => ReleaseError::Io(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ReleaseError {
    fn from(e: serde_json::Error) -> Self {
        ReleaseError::Io(format!("serialization: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err: ReleaseError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), "not_found");

        let err: ReleaseError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert_eq!(err.kind(), "io_failure");
    }
}
