pub mod forms;
pub mod models;

pub use forms::{LoginForm, PostForm, RegisterForm};
pub use models::{Post, PublicUser, User};
