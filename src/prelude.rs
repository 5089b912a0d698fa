//! Convenience re-exports for common use.

pub use crate::api::{ApiClient, FilePart, JobState, JobStatus, PollSettings, UploadOutcome};
pub use crate::auth::{
    AuthError, AuthOrchestrator, AuthSession, AuthStage, AuthState, FileStorage, MemoryStorage,
    StorageBackend, TokenBundle, TokenStore, UserProfile,
};
pub use crate::config::{Environment, SheafConfig};
pub use crate::error::{Result, SheafError};
