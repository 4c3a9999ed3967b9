//! # forge-relay API
//!
//! REST facade over GitLab. Each endpoint under `/v1/projects` forwards its
//! parameters to one GitLab call (three for project creation), made as the
//! user named by the `userId` query parameter, or as the administrator when
//! it is absent. Failures come back as a named error such as
//! `error.branch.create`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use forge_api::ApiServer;
//! use forge_config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let server = ApiServer::new(&config)?;
//!     server.serve(&config.server.bind).await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub use crate::error::{ApiError, ApiResult, ErrorResponse};
pub use crate::server::{routes, ApiServer, AppState};

pub mod error;
pub mod handlers;
pub mod logging;
pub mod server;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }
}
