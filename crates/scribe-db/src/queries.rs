use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, Row, params};
use scribe_types::{Post, PublicUser, User};
use tracing::{debug, info, warn};

use crate::password::{hash_password, verify_against_dummy, verify_password};
use crate::{Database, Result, StoreError};

// Posts joined to their author's public columns (eliminates N+1)
const POST_SELECT: &str = "
    SELECT p.id, p.title, p.content, p.user_id, p.created_at, p.updated_at,
           u.id, u.username, u.email
    FROM posts p
    JOIN users u ON p.user_id = u.id";

const USER_SELECT: &str =
    "SELECT id, username, email, password, created_at, updated_at FROM users";

impl Database {
    // -- Posts --

    /// All posts, newest first, each with its author populated.
    pub fn find_all_posts(&self) -> Result<Vec<Post>> {
        self.with_conn(|conn| {
            if !table_exists(conn, "posts")? {
                debug!("posts table missing, returning no posts");
                return Ok(vec![]);
            }

            let mut stmt =
                conn.prepare(&format!("{POST_SELECT} ORDER BY p.created_at DESC, p.id DESC"))?;
            let posts = stmt
                .query_map([], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            debug!("Loaded {} posts", posts.len());
            Ok(posts)
        })
    }

    pub fn find_post_by_id(&self, id: i64) -> Result<Post> {
        self.with_conn(|conn| {
            conn.query_row(&format!("{POST_SELECT} WHERE p.id = ?1"), [id], post_from_row)
                .found()
        })
    }

    /// Insert `post`, then write the assigned id and timestamps back into it.
    pub fn create_post(&self, post: &mut Post) -> Result<()> {
        let now = Utc::now();
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (title, content, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![post.title, post.content, post.user_id, now],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        post.id = id;
        post.created_at = now;
        post.updated_at = now;
        info!("Post {} created by user {}", id, post.user_id);
        Ok(())
    }

    /// Rewrite title and content. Author and `created_at` are left alone.
    pub fn update_post(&self, post: &mut Post) -> Result<()> {
        let now = Utc::now();
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE posts SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
                params![post.title, post.content, now, post.id],
            )?)
        })?;

        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        post.updated_at = now;
        info!("Post {} updated", post.id);
        Ok(())
    }

    /// Removing a post that does not exist is not an error.
    pub fn delete_post(&self, id: i64) -> Result<()> {
        let removed = self.with_conn(|conn| Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id])?))?;
        if removed == 0 {
            debug!("delete_post: no post {}", id);
        } else {
            info!("Post {} deleted", id);
        }
        Ok(())
    }

    // -- Users --

    pub fn find_user_by_id(&self, id: i64) -> Result<User> {
        self.with_conn(|conn| {
            conn.query_row(&format!("{USER_SELECT} WHERE id = ?1"), [id], user_from_row)
                .found()
        })
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<User> {
        self.with_conn(|conn| {
            conn.query_row(&format!("{USER_SELECT} WHERE username = ?1"), [username], user_from_row)
                .found()
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<User> {
        self.with_conn(|conn| {
            conn.query_row(&format!("{USER_SELECT} WHERE email = ?1"), [email], user_from_row)
                .found()
        })
    }

    /// Store a new user. `user.password` goes in as plaintext and comes out
    /// as the stored Argon2 hash; id and timestamps are assigned.
    pub fn create_user(&self, user: &mut User) -> Result<()> {
        let password_hash = hash_password(&user.password)?;
        let now = Utc::now();

        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![user.username, user.email, password_hash, now],
            )
            .map_err(into_conflict)?;
            Ok(conn.last_insert_rowid())
        })?;

        user.id = id;
        user.password = password_hash;
        user.created_at = now;
        user.updated_at = now;
        info!("User {} registered as {}", id, user.username);
        Ok(())
    }

    /// Change username and email. The password is never touched here.
    pub fn update_user(&self, user: &mut User) -> Result<()> {
        let now = Utc::now();
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET username = ?1, email = ?2, updated_at = ?3 WHERE id = ?4",
                params![user.username, user.email, now, user.id],
            )
            .map_err(into_conflict)
        })?;

        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        user.updated_at = now;
        Ok(())
    }

    /// Fails with `Conflict` while the user still authors posts.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", [id])
                .map_err(into_conflict)?;
            Ok(())
        })
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = match self.find_user_by_username(username) {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                verify_against_dummy(password);
                warn!("Authentication failed for {}", username);
                return Err(StoreError::Unauthorized);
            }
            Err(e) => return Err(e),
        };

        if !verify_password(password, &user.password)? {
            warn!("Authentication failed for {}", username);
            return Err(StoreError::Unauthorized);
        }

        debug!("Authenticated {}", user.username);
        Ok(user)
    }
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [name],
        |row| row.get(0),
    )?)
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get::<_, DateTime<Utc>>(4)?,
        updated_at: row.get::<_, DateTime<Utc>>(5)?,
        author: Some(PublicUser {
            id: row.get(6)?,
            username: row.get(7)?,
            email: row.get(8)?,
        }),
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Map constraint violations to `Conflict`, naming the offending column
/// when SQLite reports one.
fn into_conflict(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, ref msg) if e.code == ErrorCode::ConstraintViolation => {
            let msg = msg.as_deref().unwrap_or_default();
            let what = if msg.contains("users.email") {
                "email already exists"
            } else if msg.contains("users.username") {
                "username already exists"
            } else if msg.contains("FOREIGN KEY") {
                "user still has posts"
            } else {
                "constraint violated"
            };
            StoreError::Conflict(what.to_string())
        }
        other => other.into(),
    }
}

/// Extension trait turning "no rows" into `StoreError::NotFound`.
trait FoundExt<T> {
    fn found(self) -> Result<T>;
}

impl<T> FoundExt<T> for std::result::Result<T, rusqlite::Error> {
    fn found(self) -> Result<T> {
        match self {
            Ok(val) => Ok(val),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}
