use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use scribe_types::{Post, PostForm, PublicUser};
use tracing::{error, info, warn};

use crate::session::CurrentUser;
use crate::{AppError, AppState, views, with_db};

/// Path ids that are not integers name no post.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// Ownership is checked against the stored post, never against anything the
/// session claims beyond the caller's id.
fn authorize(post: &Post, user: &PublicUser) -> Result<(), AppError> {
    if !post.is_authored_by(user) {
        warn!("User {} tried to modify post {} owned by {}", user.id, post.id, post.user_id);
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// GET /. A store failure still renders the page, just without posts.
pub async fn home(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Html<String> {
    let posts = match with_db(&state, |db| db.find_all_posts()).await {
        Ok(posts) => posts,
        Err(e) => {
            error!("Failed to load posts for the front page: {}", e);
            Vec::new()
        }
    };

    views::render(views::home(user.as_ref(), &posts))
}

/// GET /posts
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    let posts = with_db(&state, |db| db.find_all_posts()).await?;
    Ok(views::render(views::posts_index(user.as_ref(), &posts)))
}

/// GET /posts/{id}
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id)?;
    let post = with_db(&state, move |db| db.find_post_by_id(id)).await?;
    Ok(views::render(views::post_show(user.as_ref(), &post)))
}

/// GET /posts/new
pub async fn new_form(user: CurrentUser) -> Result<Html<String>, AppError> {
    let user = user.require()?;
    Ok(views::render(views::post_new(&user, "", "", None)))
}

/// POST /posts/create
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    form: Result<Form<PostForm>, FormRejection>,
) -> Result<Response, AppError> {
    let user = user.require()?;
    let Form(form) = form?;

    if let Err(msg) = form.validate() {
        let page = views::post_new(&user, &form.title, &form.content, Some(msg));
        return Ok((StatusCode::BAD_REQUEST, views::render(page)).into_response());
    }

    let mut post = Post::new(form.title, form.content, user.id);
    let post = with_db(&state, move |db| {
        db.create_post(&mut post)?;
        Ok(post)
    })
    .await?;

    info!("User {} published post {}", user.id, post.id);
    Ok(Redirect::to(&format!("/posts/{}", post.id)).into_response())
}

/// GET /posts/edit/{id}
pub async fn edit_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let user = user.require()?;
    let id = parse_id(&id)?;

    let post = with_db(&state, move |db| db.find_post_by_id(id)).await?;
    authorize(&post, &user)?;

    Ok(views::render(views::post_edit(&user, &post, None)))
}

/// POST /posts/update/{id}
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    form: Result<Form<PostForm>, FormRejection>,
) -> Result<Response, AppError> {
    let user = user.require()?;
    let id = parse_id(&id)?;
    let Form(form) = form?;

    if let Err(msg) = form.validate() {
        let mut draft = Post::new(form.title, form.content, user.id);
        draft.id = id;
        let page = views::post_edit(&user, &draft, Some(msg));
        return Ok((StatusCode::BAD_REQUEST, views::render(page)).into_response());
    }

    let mut post = with_db(&state, move |db| db.find_post_by_id(id)).await?;
    authorize(&post, &user)?;

    post.title = form.title;
    post.content = form.content;
    with_db(&state, move |db| db.update_post(&mut post)).await?;

    Ok(Redirect::to(&format!("/posts/{}", id)).into_response())
}

/// POST /posts/delete/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let user = user.require()?;
    let id = parse_id(&id)?;

    let post = with_db(&state, move |db| db.find_post_by_id(id)).await?;
    authorize(&post, &user)?;

    with_db(&state, move |db| db.delete_post(id)).await?;

    info!("User {} deleted post {}", user.id, id);
    Ok(Redirect::to("/posts"))
}

/// Any path no route claims.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
