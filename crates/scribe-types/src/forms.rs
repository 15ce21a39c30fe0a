use serde::Deserialize;

// -- Posts --

#[derive(Debug, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl PostForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        if is_blank(&self.title) || is_blank(&self.content) {
            return Err("Title and content must not be empty");
        }
        Ok(())
    }
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        if is_blank(&self.username) || self.password.is_empty() {
            return Err("Username and password must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        if is_blank(&self.username) || is_blank(&self.email) || self.password.is_empty() {
            return Err("All fields are required");
        }
        if self.password != self.confirm_password {
            return Err("Passwords do not match");
        }
        Ok(())
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_form_requires_title_and_content() {
        let ok = PostForm { title: "Hi".into(), content: "World".into() };
        assert!(ok.validate().is_ok());

        let no_title = PostForm { title: "   ".into(), content: "World".into() };
        assert!(no_title.validate().is_err());

        let no_content = PostForm { title: "Hi".into(), content: String::new() };
        assert!(no_content.validate().is_err());
    }

    #[test]
    fn register_form_checks_confirmation() {
        let mut form = RegisterForm {
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "pw123".into(),
            confirm_password: "pw123".into(),
        };
        assert!(form.validate().is_ok());

        form.confirm_password = "pw124".into();
        assert_eq!(form.validate(), Err("Passwords do not match"));

        form.email.clear();
        assert_eq!(form.validate(), Err("All fields are required"));
    }

    #[test]
    fn login_form_rejects_missing_password() {
        let form = LoginForm { username: "alice".into(), password: String::new() };
        assert!(form.validate().is_err());
    }
}
