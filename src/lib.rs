//! Sheaf client SDK
//!
//! Rust client for the Sheaf document service: Google OAuth sign-in
//! through the site relay, token storage and refresh, audience-scoped
//! tokens, and authenticated document uploads with job polling.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sheaf::prelude::*;
//!
//! # async fn example() -> sheaf::error::Result<()> {
//! let config = SheafConfig::from_env();
//! let store = TokenStore::new(Arc::new(FileStorage::new_default()));
//! let session = AuthSession::new(Arc::new(AuthOrchestrator::new(config, store)));
//!
//! let login_url = session.begin_login()?;
//! println!("open {login_url}");
//! // after the provider redirects back:
//! let user = session.complete_login("code=4%2Fabc123").await?;
//! println!("signed in as {}", user.email);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;
pub mod util;
