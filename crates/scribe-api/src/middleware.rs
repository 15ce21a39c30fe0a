use std::any::Any;
use std::backtrace::Backtrace;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::views;

/// Log every panic through `tracing`, with the panic site's backtrace.
/// The hook runs before unwinding, so this is the only place the panicking
/// stack is still available.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = Backtrace::force_capture();
        error!("panic: {}\n{}", info, backtrace);
    }));
}

/// Turn a panic caught by `CatchPanicLayer` into the generic 500 page so one
/// bad request never takes the server down.
pub fn recover_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    error!("Recovered from handler panic: {}", detail);

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (status, views::render(views::error_page(status, "Internal server error"))).into_response()
}
