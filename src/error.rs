use thiserror::Error;

/// An upload or record that falls outside the accepted policy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unsupported video format: {0}")]
    UnsupportedType(String),

    #[error("file too large: {size} bytes (limit {max})")]
    TooLarge { size: u64, max: u64 },
}

/// Enumerates errors returned by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The store could not be opened or no connection was available.
    #[error("store unavailable: {0}")]
    Open(String),

    #[error("failed to read from store")]
    Read {
        #[source]
        source: diesel::result::Error,
    },

    #[error("failed to write to store")]
    Write {
        #[source]
        source: diesel::result::Error,
    },

    /// A stored row could not be mapped back onto a record.
    #[error("corrupt record {video_id}: {reason}")]
    Corrupt { video_id: String, reason: String },
}

/// Errors raised by the playback resolver.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("store unavailable while resolving {video_id}")]
    StoreUnavailable {
        video_id: String,
        #[source]
        source: StoreError,
    },

    #[error("no playback session for {0}")]
    NoSession(String),

    #[error("cannot {action} video {video_id} while {state}")]
    InvalidTransition {
        video_id: String,
        state: &'static str,
        action: &'static str,
    },
}
