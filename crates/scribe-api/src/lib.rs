pub mod auth;
pub mod error;
pub mod middleware;
pub mod posts;
pub mod router;
pub mod session;
pub mod views;

use std::sync::Arc;

use scribe_db::Database;

pub use error::AppError;
pub use router::{RouterConfig, router};
pub use session::{CurrentUser, SessionKeys};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionKeys,
}

/// Run a store call on the blocking pool. SQLite access is synchronous, so
/// it must stay off the async worker threads.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Database) -> scribe_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || f(&state.db)).await?;
    Ok(result?)
}
