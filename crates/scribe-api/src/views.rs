use axum::{http::StatusCode, response::Html};
use chrono::{Datelike, Utc};
use maud::{DOCTYPE, Markup, html};
use scribe_types::{Post, PublicUser};

const EXCERPT_CHARS: usize = 200;

pub fn render(markup: Markup) -> Html<String> {
    Html(markup.into_string())
}

fn layout(title: &str, user: Option<&PublicUser>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | Scribe" }
                link rel="stylesheet" href="/static/css/style.css";
            }
            body {
                header {
                    nav {
                        a.brand href="/" { "Scribe" }
                        a href="/posts" { "All posts" }
                        @if let Some(user) = user {
                            a href="/posts/new" { "New post" }
                            span.user { (user.username) }
                            form.inline method="post" action="/logout" {
                                button type="submit" { "Log out" }
                            }
                        } @else {
                            a href="/login" { "Log in" }
                            a href="/register" { "Register" }
                        }
                    }
                }
                main { (body) }
                footer {
                    p { "\u{a9} " (Utc::now().year()) " Scribe" }
                }
                script src="/static/js/app.js" {}
            }
        }
    }
}

fn author_name(post: &Post) -> &str {
    post.author
        .as_ref()
        .map(|a| a.username.as_str())
        .unwrap_or("unknown")
}

fn excerpt(content: &str) -> String {
    match content.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}\u{2026}", &content[..cut]),
        None => content.to_string(),
    }
}

fn post_summary(post: &Post) -> Markup {
    html! {
        article.post-summary {
            h2 { a href={ "/posts/" (post.id) } { (post.title) } }
            p.meta {
                "by " (author_name(post)) " on "
                time datetime=(post.created_at.to_rfc3339()) {
                    (post.created_at.format("%Y-%m-%d %H:%M").to_string())
                }
            }
            p { (excerpt(&post.content)) }
        }
    }
}

fn post_list(posts: &[Post]) -> Markup {
    html! {
        @if posts.is_empty() {
            p.empty { "No posts yet." }
        } @else {
            @for post in posts {
                (post_summary(post))
            }
        }
    }
}

pub fn home(user: Option<&PublicUser>, posts: &[Post]) -> Markup {
    layout(
        "Home",
        user,
        html! {
            h1 { "Recent posts" }
            (post_list(posts))
        },
    )
}

pub fn posts_index(user: Option<&PublicUser>, posts: &[Post]) -> Markup {
    layout(
        "All posts",
        user,
        html! {
            h1 { "All posts" }
            (post_list(posts))
        },
    )
}

pub fn post_show(user: Option<&PublicUser>, post: &Post) -> Markup {
    let is_author = user.is_some_and(|u| post.is_authored_by(u));

    layout(
        &post.title,
        user,
        html! {
            article.post {
                h1 { (post.title) }
                p.meta {
                    "by " (author_name(post)) " on " (post.created_at.format("%Y-%m-%d %H:%M").to_string())
                    @if post.updated_at != post.created_at {
                        " (edited " (post.updated_at.format("%Y-%m-%d %H:%M").to_string()) ")"
                    }
                }
                div.content {
                    @for paragraph in post.content.lines() {
                        p { (paragraph) }
                    }
                }
            }
            @if is_author {
                div.actions {
                    a href={ "/posts/edit/" (post.id) } { "Edit" }
                    form.inline.confirm method="post" action={ "/posts/delete/" (post.id) } {
                        button type="submit" { "Delete" }
                    }
                }
            }
        },
    )
}

fn post_form(action: &str, submit: &str, title: &str, content: &str, error: Option<&str>) -> Markup {
    html! {
        @if let Some(error) = error {
            p.error { (error) }
        }
        form method="post" action=(action) {
            label for="title" { "Title" }
            input #title type="text" name="title" value=(title) required;
            label for="content" { "Content" }
            textarea #content name="content" rows="12" required { (content) }
            button type="submit" { (submit) }
        }
    }
}

pub fn post_new(user: &PublicUser, title: &str, content: &str, error: Option<&str>) -> Markup {
    layout(
        "New post",
        Some(user),
        html! {
            h1 { "New post" }
            (post_form("/posts/create", "Publish", title, content, error))
        },
    )
}

pub fn post_edit(user: &PublicUser, post: &Post, error: Option<&str>) -> Markup {
    let action = format!("/posts/update/{}", post.id);
    layout(
        "Edit post",
        Some(user),
        html! {
            h1 { "Edit post" }
            (post_form(&action, "Save", &post.title, &post.content, error))
        },
    )
}

pub fn login(username: &str, error: Option<&str>) -> Markup {
    layout(
        "Log in",
        None,
        html! {
            h1 { "Log in" }
            @if let Some(error) = error {
                p.error { (error) }
            }
            form method="post" action="/login/process" {
                label for="username" { "Username" }
                input #username type="text" name="username" value=(username) required;
                label for="password" { "Password" }
                input #password type="password" name="password" required;
                button type="submit" { "Log in" }
            }
            p { "No account yet? " a href="/register" { "Register" } }
        },
    )
}

pub fn register(username: &str, email: &str, error: Option<&str>) -> Markup {
    layout(
        "Register",
        None,
        html! {
            h1 { "Register" }
            @if let Some(error) = error {
                p.error { (error) }
            }
            form method="post" action="/register/process" {
                label for="username" { "Username" }
                input #username type="text" name="username" value=(username) required;
                label for="email" { "Email" }
                input #email type="email" name="email" value=(email) required;
                label for="password" { "Password" }
                input #password type="password" name="password" required;
                label for="confirm_password" { "Confirm password" }
                input #confirm_password type="password" name="confirm_password" required;
                button type="submit" { "Create account" }
            }
            p { "Already registered? " a href="/login" { "Log in" } }
        },
    )
}

pub fn error_page(status: StatusCode, message: &str) -> Markup {
    let reason = status.canonical_reason().unwrap_or("Error");
    layout(
        reason,
        None,
        html! {
            h1 { (status.as_u16()) " " (reason) }
            p.error { (message) }
            p { a href="/" { "Back to the front page" } }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> PublicUser {
        PublicUser { id: 1, username: "alice".into(), email: "a@x.com".into() }
    }

    fn post_by(author: &PublicUser, title: &str, content: &str) -> Post {
        let mut post = Post::new(title, content, author.id);
        post.id = 5;
        post.author = Some(author.clone());
        post
    }

    #[test]
    fn user_content_is_escaped() {
        let post = post_by(&alice(), "<script>alert(1)</script>", "a & b");
        let page = post_show(None, &post).into_string();

        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("a &amp; b"));
    }

    #[test]
    fn author_sees_controls() {
        let alice = alice();
        let bob = PublicUser { id: 2, username: "bob".into(), email: "b@x.com".into() };
        let post = post_by(&alice, "Hi", "World");

        assert!(post_show(Some(&alice), &post).into_string().contains("/posts/edit/5"));
        assert!(!post_show(Some(&bob), &post).into_string().contains("/posts/edit/5"));
        assert!(!post_show(None, &post).into_string().contains("/posts/delete/5"));
    }

    #[test]
    fn nav_reflects_session() {
        let anonymous = home(None, &[]).into_string();
        assert!(anonymous.contains("href=\"/login\""));
        assert!(anonymous.contains("No posts yet."));

        let signed_in = home(Some(&alice()), &[]).into_string();
        assert!(signed_in.contains("alice"));
        assert!(signed_in.contains("action=\"/logout\""));
    }

    #[test]
    fn long_content_is_shortened_in_lists() {
        let body = "x".repeat(EXCERPT_CHARS + 50);
        let post = post_by(&alice(), "Long", &body);
        let page = posts_index(None, &[post]).into_string();

        assert!(!page.contains(&body));
        assert!(page.contains(&format!("{}\u{2026}", "x".repeat(EXCERPT_CHARS))));
    }

    #[test]
    fn error_page_shows_status() {
        let page = error_page(StatusCode::FORBIDDEN, "nope").into_string();
        assert!(page.contains("403 Forbidden"));
        assert!(page.contains("nope"));
    }
}
