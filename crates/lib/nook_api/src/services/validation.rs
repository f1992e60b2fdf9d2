//! Request field validation.

use std::borrow::Cow;

use url::Url;
use validator::{ValidateEmail, ValidationError};

use crate::error::{AppError, AppResult};

pub const NAME_LEN: (usize, usize) = (2, 50);
pub const USERNAME_LEN: (usize, usize) = (3, 30);
pub const POST_LEN: (usize, usize) = (1, 280);
pub const COMMENT_LEN: (usize, usize) = (1, 500);

/// Check that `value` has between `min` and `max` characters.
pub fn length(field: &str, value: &str, (min, max): (usize, usize)) -> AppResult<()> {
    let n = value.chars().count();
    if n < min || n > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

pub fn required(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn email(value: &str) -> AppResult<()> {
    if !value.validate_email() {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(())
}

/// Username alphabet, shared by the derived request validators.
pub fn username_chars(value: &str) -> Result<(), ValidationError> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Ok(());
    }
    Err(ValidationError::new("username_chars").with_message(Cow::Borrowed(
        "username may only contain letters, digits, '_' and '.'",
    )))
}

pub fn username(value: &str) -> AppResult<()> {
    length("username", value, USERNAME_LEN)?;
    username_chars(value).map_err(|e| {
        AppError::Validation(e.message.map(|m| m.into_owned()).unwrap_or_default())
    })
}

/// Every entry must be an absolute http(s) URL.
pub fn urls(field: &str, values: &[String]) -> AppResult<()> {
    for value in values {
        url(field, value)?;
    }
    Ok(())
}

pub fn url(field: &str, value: &str) -> AppResult<()> {
    match Url::parse(value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        _ => Err(AppError::Validation(format!("{field} must contain valid URLs"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(length("content", "héllo", (1, 5)).is_ok());
        assert!(length("content", "", POST_LEN).is_err());
        assert!(length("content", &"a".repeat(281), POST_LEN).is_err());
        assert!(length("content", &"a".repeat(280), POST_LEN).is_ok());
    }

    #[test]
    fn email_shapes() {
        assert!(email("ann@x.com").is_ok());
        assert!(email("a.b+c@mail.example.org").is_ok());
        for bad in [
            "", "ann", "@x.com", "ann@", "ann@x.", "a n@x.com", "a@b@c.com", "a@b..c", "a@-.com",
        ] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn usernames() {
        assert!(username("ann_1.b").is_ok());
        assert!(username("an").is_err());
        assert!(username("ann smith").is_err());
    }

    #[test]
    fn derived_request_rules() {
        use validator::Validate;

        use crate::models::SignUpRequest;

        let ok = SignUpRequest {
            name: "Ann".into(),
            username: "ann1".into(),
            email: "ann@x.com".into(),
            password: "password123".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = SignUpRequest {
            name: "A".into(),
            username: "ann smith".into(),
            email: "a@b..c".into(),
            ..ok
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("password"));

        let err = AppError::from(errors);
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("Invalid email address")));
    }

    #[test]
    fn urls_require_http_scheme() {
        assert!(urls("image_urls", &["https://img.example/a.png".into()]).is_ok());
        assert!(urls("image_urls", &["not a url".into()]).is_err());
        assert!(urls("image_urls", &["ftp://files.example/a".into()]).is_err());
        assert!(urls("image_urls", &[]).is_ok());
    }

    #[test]
    fn short_passwords_are_rejected() {
        use validator::Validate;

        let req = crate::models::SignUpRequest {
            name: "Ann".into(),
            username: "ann1".into(),
            email: "ann@x.com".into(),
            password: "short".into(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
