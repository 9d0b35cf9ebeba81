use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, post},
};

use super::{applies, projects, session, spaces};
use crate::config::ServerConfig;
use crate::mail::Mailer;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: ServerConfig,
    /// Absent when no `[mail]` section is configured.
    pub mailer: Option<Arc<Mailer>>,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Session
        .route("/me", get(session::me))
        .route("/logout", post(session::logout))
        .route("/token/refresh", post(session::refresh))
        // Spaces
        .route("/spaces", get(spaces::list_spaces).post(spaces::create_space))
        .route("/spaces/exists", get(spaces::space_exists))
        .route(
            "/spaces/{id}",
            get(spaces::get_space)
                .put(spaces::update_space)
                .delete(spaces::delete_space),
        )
        .route("/spaces/{id}/members", post(spaces::add_member))
        .route(
            "/spaces/{id}/members/{user_id}",
            delete(spaces::remove_member),
        )
        // Projects
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        // Applies
        .route(
            "/applies",
            get(applies::list_applies).post(applies::create_apply),
        )
        .route(
            "/applies/{id}",
            get(applies::get_apply).put(applies::update_apply),
        )
        .route("/applies/{id}/audit", post(applies::audit_apply))
        .route("/applies/{id}/drop", post(applies::drop_apply))
        .route("/applies/{id}/status", post(applies::report_status))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
