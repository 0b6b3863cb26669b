//! Shared-secret authentication for the controller channel.
//!
//! Every controller operation -- the connect handshake and each request
//! after it -- passes through [`AuthGuard::authenticate`]. A failed check
//! terminates the connection without applying any state change.
//!
//! The comparison is plain string equality. There is no rate limiting,
//! lockout, or constant-time comparison; the secret gates a trusted
//! tabletop session, not an internet-facing account system.

use std::path::Path;

/// Validates the moderator's shared-secret credential.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    secret: String,
}

impl AuthGuard {
    /// Create a guard around the given shared secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Load the shared secret from a key file, trimming surrounding
    /// whitespace (key files routinely end in a newline).
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be read.
    pub fn from_key_file(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::new(contents.trim()))
    }

    /// Whether the presented credential matches the configured secret.
    pub fn authenticate(&self, credential: &str) -> bool {
        credential == self.secret
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn matching_credential_is_accepted() {
        let guard = AuthGuard::new("hunter2");
        assert!(guard.authenticate("hunter2"));
    }

    #[test]
    fn mismatched_credential_is_rejected() {
        let guard = AuthGuard::new("hunter2");
        assert!(!guard.authenticate("hunter3"));
        assert!(!guard.authenticate(""));
        assert!(!guard.authenticate("hunter2 "));
    }

    #[test]
    fn key_file_is_trimmed() {
        let path = std::env::temp_dir().join(format!("mistmap-key-{}", std::process::id()));
        std::fs::write(&path, "s3cret\n").unwrap();
        let guard = AuthGuard::from_key_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(guard.authenticate("s3cret"));
    }
}
