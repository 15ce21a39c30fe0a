use std::path::PathBuf;
use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::ServeDir,
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::middleware::recover_panic;
use crate::{AppState, auth, posts};

/// Settings the HTTP surface needs beyond the shared state.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub static_dir: PathBuf,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("./public"),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(60),
        }
    }
}

/// The whole site. Layers, outermost first: panic recovery, access log,
/// timeouts, then route dispatch.
pub fn router(state: AppState, config: &RouterConfig) -> Router {
    Router::new()
        .route("/", get(posts::home))
        .route("/posts", get(posts::list))
        .route("/posts/new", get(posts::new_form))
        .route("/posts/create", post(posts::create))
        .route("/posts/edit/{id}", get(posts::edit_form))
        .route("/posts/update/{id}", post(posts::update))
        .route("/posts/delete/{id}", post(posts::delete))
        .route("/posts/{id}", get(posts::show))
        .route("/login", get(auth::login_form))
        .route("/login/process", post(auth::login))
        .route("/register", get(auth::register_form))
        .route("/register/process", post(auth::register))
        .route("/logout", get(auth::logout).post(auth::logout))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .fallback(posts::not_found)
        .with_state(state)
        .layer(RequestBodyTimeoutLayer::new(config.read_timeout))
        .layer(write_deadline(config.write_timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).latency_unit(tower_http::LatencyUnit::Millis)),
        )
        .layer(CatchPanicLayer::custom(recover_panic))
}

/// Whole-request deadline. A handler still running when it passes is
/// dropped and the client gets 408.
fn write_deadline(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn slow_handler_hits_the_write_deadline() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "too late"
                }),
            )
            .route("/fast", get(|| async { "done" }))
            .layer(write_deadline(Duration::from_millis(50)));

        let response = app
            .clone()
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let response = app
            .oneshot(Request::get("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
