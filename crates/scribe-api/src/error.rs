use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use scribe_db::StoreError;
use thiserror::Error;
use tracing::{debug, error};

use crate::views;

#[derive(Debug, Error)]
pub enum AppError {
    /// Anonymous visitor hit a page that needs a session.
    #[error("login required")]
    LoginRequired,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("invalid username or password")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("session error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::LoginRequired => StatusCode::SEE_OTHER,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Session(_) | AppError::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound,
            StoreError::Conflict(what) => AppError::Conflict(capitalize(&what)),
            StoreError::Unauthorized => AppError::Unauthorized,
            other => AppError::Store(other),
        }
    }
}

/// A body that is not a readable urlencoded form is bad input.
impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        debug!("Rejected form body: {}", rejection.body_text());
        AppError::validation("Could not read the submitted form")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::LoginRequired => return Redirect::to("/login").into_response(),
            AppError::NotFound => "Page not found".to_string(),
            AppError::Forbidden => "You are not allowed to change this post".to_string(),
            AppError::Unauthorized => "Invalid username or password".to_string(),
            AppError::Conflict(msg) | AppError::Validation(msg) => msg,
            ref internal => {
                error!("{}", internal);
                "Internal server error".to_string()
            }
        };

        (status, views::render(views::error_page(status, &message))).into_response()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
