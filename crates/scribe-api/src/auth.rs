use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use scribe_db::{Database, StoreError};
use scribe_types::{LoginForm, RegisterForm, User};
use tracing::info;

use crate::session::{CurrentUser, create_session, destroy_session};
use crate::{AppError, AppState, views, with_db};

/// GET /login
pub async fn login_form(CurrentUser(user): CurrentUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    views::render(views::login("", None)).into_response()
}

/// POST /login/process
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(form) = form?;
    if let Err(msg) = form.validate() {
        let page = views::login(&form.username, Some(msg));
        return Ok((StatusCode::BAD_REQUEST, views::render(page)).into_response());
    }

    let username = form.username.clone();
    let result = with_db(&state, move |db| db.authenticate(form.username.trim(), &form.password)).await;

    let user = match result {
        Ok(user) => user,
        Err(AppError::Unauthorized) => {
            let page = views::login(&username, Some("Invalid username or password"));
            return Ok((StatusCode::UNAUTHORIZED, views::render(page)).into_response());
        }
        Err(e) => return Err(e),
    };

    let jar = create_session(jar, &state.sessions, &user.public())?;
    info!("User {} logged in", user.id);
    Ok((jar, Redirect::to("/")).into_response())
}

/// GET|POST /logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (destroy_session(jar), Redirect::to("/"))
}

/// GET /register
pub async fn register_form(CurrentUser(user): CurrentUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    views::render(views::register("", "", None)).into_response()
}

/// POST /register/process
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(form) = form?;
    if let Err(msg) = form.validate() {
        let page = views::register(&form.username, &form.email, Some(msg));
        return Ok((StatusCode::BAD_REQUEST, views::render(page)).into_response());
    }

    let new_user = User::new(form.username.trim(), form.email.trim(), form.password.as_str());
    let user = match with_db(&state, move |db| register_user(db, new_user)).await {
        Ok(user) => user,
        Err(AppError::Conflict(msg)) => {
            let page = views::register(&form.username, &form.email, Some(&msg));
            return Ok((StatusCode::CONFLICT, views::render(page)).into_response());
        }
        Err(e) => return Err(e),
    };

    let jar = create_session(jar, &state.sessions, &user.public())?;
    Ok((jar, Redirect::to("/")).into_response())
}

/// Check the username and email up front for a precise message, then
/// insert. The two steps are not atomic: a concurrent registration can slip
/// between them, and the unique constraints then report it as `Conflict`.
fn register_user(db: &Database, mut user: User) -> Result<User, StoreError> {
    match db.find_user_by_username(&user.username) {
        Ok(_) => return Err(StoreError::Conflict("username already exists".into())),
        Err(StoreError::NotFound) => {}
        Err(e) => return Err(e),
    }
    match db.find_user_by_email(&user.email) {
        Ok(_) => return Err(StoreError::Conflict("email already exists".into())),
        Err(StoreError::NotFound) => {}
        Err(e) => return Err(e),
    }

    db.create_user(&mut user)?;
    Ok(user)
}
