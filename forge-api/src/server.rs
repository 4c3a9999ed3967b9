//! HTTP server for forge-relay
//!
//! Maps every `/v1/projects/...` route onto its handler and serves them with
//! shared [`AppState`], which only knows how to get a GitLab client for a
//! user.

use std::sync::Arc;

use axum::{
    response::Json,
    routing::{get, post, put},
    Router,
};
use forge_config::Config;
use forge_remote::{ClientFactory, GitlabApi, SudoFactory};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::handlers::{member, project, repository};
use crate::{ApiError, ApiResult};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    factory: Arc<dyn ClientFactory>,
}

impl AppState {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self { factory }
    }

    /// GitLab client acting as `user_id`, or as the administrator. A failed
    /// lookup is reported under the calling operation's `code`.
    pub fn client(
        &self,
        user_id: Option<u64>,
        code: &'static str,
    ) -> ApiResult<Arc<dyn GitlabApi>> {
        self.factory.client(user_id).map_err(ApiError::common(code))
    }
}

/// Main API server struct
pub struct ApiServer {
    state: AppState,
    cors: bool,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

impl ApiServer {
    /// Server talking to the GitLab instance described by `config`.
    pub fn new(config: &Config) -> ApiResult<Self> {
        let factory = SudoFactory::from_config(&config.gitlab).map_err(|e| {
            ApiError::internal(format!("Failed to create GitLab client: {}", e))
        })?;
        info!("Forwarding to GitLab at {}", factory.url());
        Ok(Self::with_factory(Arc::new(factory)).cors(config.server.cors))
    }

    pub fn with_factory(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            state: AppState::new(factory),
            cors: true,
        }
    }

    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = enabled;
        self
    }

    pub fn router(&self) -> Router {
        let app = routes()
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());
        if self.cors {
            app.layer(CorsLayer::permissive())
        } else {
            app
        }
    }

    /// Serve until Ctrl-C or SIGTERM.
    pub async fn serve(self, addr: impl AsRef<str>) -> ApiResult<()> {
        let addr = addr.as_ref();
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind to {}: {}", addr, e)))?;
        info!("Starting forge-relay API server on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/projects", post(project::create_project))
        .route(
            "/v1/projects/:project_id",
            put(project::update_project).delete(project::delete_project),
        )
        .route(
            "/v1/projects/:project_id/variables",
            post(project::create_variable),
        )
        .route(
            "/v1/projects/:project_id/protected_branches",
            get(project::list_protected_branches).post(project::protect_branch),
        )
        .route(
            "/v1/projects/:project_id/protected_branches/:name",
            get(project::query_protected_branch).delete(project::unprotect_branch),
        )
        .route(
            "/v1/projects/:project_id/members",
            post(member::add_member).put(member::update_member),
        )
        .route(
            "/v1/projects/:project_id/members/:member_id",
            get(member::query_member).delete(member::remove_member),
        )
        .route(
            "/v1/projects/:project_id/repository/branches",
            get(repository::list_branches)
                .post(repository::create_branch)
                .delete(repository::delete_branch),
        )
        .route(
            "/v1/projects/:project_id/repository/branches/:branch_name",
            get(repository::query_branch),
        )
        .route(
            "/v1/projects/:project_id/repository/tags",
            get(repository::list_tags).post(repository::create_tag),
        )
        .route(
            "/v1/projects/:project_id/repository/tags/page",
            get(repository::list_tags_page),
        )
        .route(
            "/v1/projects/:project_id/repository/file",
            post(repository::create_readme),
        )
        .route(
            "/v1/projects/:project_id/repository/file/master/readme.md",
            get(repository::get_readme),
        )
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
