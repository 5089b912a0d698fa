//! OAuth sign-in flows, token lifecycle, and storage.

pub mod callback;
pub mod error;
pub mod orchestrator;
pub mod session;
pub mod storage;
pub mod store;
pub mod token;
pub mod user;

pub use callback::parse_callback_query;
pub use error::AuthError;
pub use orchestrator::AuthOrchestrator;
pub use session::{AuthSession, AuthStage, AuthState};
pub use storage::{FileStorage, FileStorageConfig, MemoryStorage, StorageBackend};
pub use store::{TokenStore, TOKEN_KEY, USER_KEY};
pub use token::{MaskedToken, TokenBundle, TokenExpiration, TokenInfo, TokenResponse};
pub use user::UserProfile;
