use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The outward-facing part of a user: what a post shows as its author and
/// what a session cookie carries. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Plaintext only between form parsing and `create_user`; an Argon2 PHC
    /// string from then on.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A user that has not been stored yet.
    pub fn new(username: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: 0,
            username: username.into(),
            email: email.into(),
            password: password.into(),
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    /// Populated by the store on reads.
    pub author: Option<PublicUser>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(title: impl Into<String>, content: impl Into<String>, user_id: i64) -> Self {
        Self {
            id: 0,
            title: title.into(),
            content: content.into(),
            user_id,
            author: None,
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    pub fn is_authored_by(&self, user: &PublicUser) -> bool {
        self.user_id == user.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_never_serialized() {
        let mut user = User::new("alice", "a@x.com", "pw123");
        user.password = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into();

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn public_projection_drops_password() {
        let mut user = User::new("alice", "a@x.com", "pw123");
        user.id = 7;

        let public = user.public();
        assert_eq!(
            public,
            PublicUser { id: 7, username: "alice".into(), email: "a@x.com".into() }
        );
    }

    #[test]
    fn authorship_compares_ids() {
        let post = Post::new("t", "c", 3);
        let owner = PublicUser { id: 3, username: "a".into(), email: "a@x".into() };
        let other = PublicUser { id: 4, username: "a".into(), email: "a@x".into() };

        assert!(post.is_authored_by(&owner));
        assert!(!post.is_authored_by(&other));
    }
}
