//! Cookie-held sessions.
//!
//! The cookie value is an HS256 JWT carrying only the public projection of
//! the user (id, username, email). Nothing is stored server-side, so the
//! signing secret is the whole trust anchor: rotating or losing it logs
//! everyone out.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use scribe_types::PublicUser;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppError, AppState};

pub const SESSION_COOKIE: &str = "scribe_session";
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub email: String,
    pub exp: usize,
}

/// Signing material shared read-only by every request.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    secure_cookies: bool,
}

impl SessionKeys {
    pub fn new(secret: &str, secure_cookies: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            secure_cookies,
        }
    }
}

/// Issue a session cookie for `user`, valid for seven days.
pub fn create_session(
    jar: CookieJar,
    keys: &SessionKeys,
    user: &PublicUser,
) -> Result<CookieJar, AppError> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        exp: (Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS)).timestamp() as usize,
    };
    let token = encode(&Header::default(), &claims, &keys.encoding)?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(keys.secure_cookies)
        .max_age(time::Duration::days(SESSION_TTL_DAYS));

    debug!("Session issued for user {}", user.id);
    Ok(jar.add(cookie))
}

/// The identity behind the session cookie, if there is a valid one.
/// Absent, malformed, expired and forged cookies all read as "no session".
pub fn current_user(jar: &CookieJar, keys: &SessionKeys) -> Option<PublicUser> {
    let cookie = jar.get(SESSION_COOKIE)?;

    match decode::<Claims>(cookie.value(), &keys.decoding, &Validation::default()) {
        Ok(data) => Some(PublicUser {
            id: data.claims.sub,
            username: data.claims.username,
            email: data.claims.email,
        }),
        Err(e) => {
            debug!("Ignoring invalid session cookie: {}", e);
            None
        }
    }
}

/// Replace the session cookie with an already-expired one.
pub fn destroy_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Extractor for the caller's identity. Never rejects.
pub struct CurrentUser(pub Option<PublicUser>);

impl CurrentUser {
    /// The signed-in user, or a redirect to the login page.
    pub fn require(self) -> Result<PublicUser, AppError> {
        self.0.ok_or(AppError::LoginRequired)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(CurrentUser(current_user(&jar, &state.sessions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> PublicUser {
        PublicUser {
            id: 1,
            username: "alice".into(),
            email: "a@x.com".into(),
        }
    }

    fn keys() -> SessionKeys {
        SessionKeys::new("test-session-secret", false)
    }

    #[test]
    fn session_round_trip() {
        let keys = keys();
        let jar = create_session(CookieJar::new(), &keys, &alice()).unwrap();

        assert_eq!(current_user(&jar, &keys), Some(alice()));
    }

    #[test]
    fn cookie_attributes() {
        let jar = create_session(CookieJar::new(), &keys(), &alice()).unwrap();
        let cookie = jar.get(SESSION_COOKIE).unwrap();

        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
        assert!(!cookie.value().contains("password"));
    }

    #[test]
    fn tampered_cookie_is_no_session() {
        let keys = keys();
        let jar = create_session(CookieJar::new(), &keys, &alice()).unwrap();
        let token = jar.get(SESSION_COOKIE).unwrap().value().to_string();

        // Flip a character in the payload segment
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let payload = &mut parts[1];
        let last = payload.pop().unwrap();
        payload.push(if last == 'A' { 'B' } else { 'A' });
        let forged = parts.join(".");

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, forged));
        assert_eq!(current_user(&jar, &keys), None);

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "garbage"));
        assert_eq!(current_user(&jar, &keys), None);
    }

    #[test]
    fn other_secret_is_no_session() {
        let jar = create_session(CookieJar::new(), &keys(), &alice()).unwrap();
        let other = SessionKeys::new("a-different-secret", false);

        assert_eq!(current_user(&jar, &other), None);
    }

    #[test]
    fn expired_token_is_no_session() {
        let keys = keys();
        let claims = Claims {
            sub: 1,
            username: "alice".into(),
            email: "a@x.com".into(),
            exp: (Utc::now() - chrono::Duration::days(8)).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, token));
        assert_eq!(current_user(&jar, &keys), None);
    }

    #[test]
    fn destroyed_session_is_gone() {
        let keys = keys();
        let jar = create_session(CookieJar::new(), &keys, &alice()).unwrap();
        let jar = destroy_session(jar);

        assert_eq!(current_user(&jar, &keys), None);
    }

    #[test]
    fn missing_session_requires_login() {
        assert!(matches!(CurrentUser(None).require(), Err(AppError::LoginRequired)));
        assert_eq!(CurrentUser(Some(alice())).require().unwrap(), alice());
    }
}
