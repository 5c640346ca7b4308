//! Version Store: raw resume records plus append-only document snapshots.
//!
//! The store handle is built once in `main` and injected through `AppState`.
//! Backends: `PgVersionStore` (sqlx / Postgres) and `MemoryVersionStore`
//! (used when no `DATABASE_URL` is configured, and in tests). Either is
//! wrapped in `RetryingStore`, which owns the transient-failure policy.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::{Document, ResumeRecord, StoredVersion, VersionFilter, VersionType};

pub mod memory;
pub mod postgres;
pub mod retry;

pub use memory::MemoryVersionStore;
pub use postgres::PgVersionStore;
pub use retry::{RetryPolicy, RetryingStore};

/// Failure classes that are worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    Timeout,
    ConnectionReset,
    RateLimited,
    NameResolution,
    PoolExhausted,
    Unavailable,
}

impl fmt::Display for TransientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransientKind::Timeout => "timeout",
            TransientKind::ConnectionReset => "connection reset",
            TransientKind::RateLimited => "rate limited",
            TransientKind::NameResolution => "name resolution failure",
            TransientKind::PoolExhausted => "pool exhausted",
            TransientKind::Unavailable => "server unavailable",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transient store failure ({kind}): {message}")]
    Transient { kind: TransientKind, message: String },

    /// Referential integrity violation, e.g. a version for an unknown resume.
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("resume {0} not found")]
    NotFound(Uuid),

    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transient { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        classify(e)
    }
}

/// Maps a driver error onto the store's failure classes.
fn classify(e: sqlx::Error) -> StoreError {
    let message = e.to_string();
    let transient = |kind| StoreError::Transient {
        kind,
        message: message.clone(),
    };

    match &e {
        sqlx::Error::PoolTimedOut => transient(TransientKind::PoolExhausted),
        sqlx::Error::PoolClosed => transient(TransientKind::Unavailable),
        sqlx::Error::Io(io) => transient(io_kind(io, &message)),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23503") => StoreError::Integrity(message.clone()),
            Some("22P02") | Some("22023") => StoreError::Malformed(message.clone()),
            // too_many_connections, cannot_connect_now, admin_shutdown
            Some("53300") | Some("57P03") | Some("57P01") => {
                transient(TransientKind::Unavailable)
            }
            // serialization_failure, deadlock_detected
            Some("40001") | Some("40P01") => transient(TransientKind::RateLimited),
            Some("57014") => transient(TransientKind::Timeout),
            _ => StoreError::Other(message.clone()),
        },
        sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
            StoreError::Malformed(message.clone())
        }
        _ if is_name_resolution(&message) => transient(TransientKind::NameResolution),
        _ => StoreError::Other(message.clone()),
    }
}

fn io_kind(io: &std::io::Error, message: &str) -> TransientKind {
    use std::io::ErrorKind;
    match io.kind() {
        ErrorKind::TimedOut => TransientKind::Timeout,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
            TransientKind::ConnectionReset
        }
        _ if is_name_resolution(message) => TransientKind::NameResolution,
        _ => TransientKind::Unavailable,
    }
}

fn is_name_resolution(message: &str) -> bool {
    let m = message.to_ascii_lowercase();
    m.contains("failed to lookup address")
        || m.contains("name or service not known")
        || m.contains("temporary failure in name resolution")
        || m.contains("nodename nor servname")
}

/// Persistence seam for resume records and their versions.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Inserts a raw record and returns its new id.
    async fn create_resume(&self, raw_text: &str) -> Result<Uuid, StoreError>;

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRecord>, StoreError>;

    /// Appends a snapshot. Fails with `NotFound` when `id` has no record.
    async fn save_version(
        &self,
        id: Uuid,
        document: &Document,
        version_type: VersionType,
    ) -> Result<(), StoreError>;

    /// Most recent snapshot matching `filter`, newest first by `created_at`.
    async fn latest_version(
        &self,
        id: Uuid,
        filter: VersionFilter,
    ) -> Result<Option<StoredVersion>, StoreError>;
}
