use crate::error::ValidationError;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LEN: usize = 6;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\S+@\S+$").expect("valid email pattern"))
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Required("Email"));
    }
    if !email_re().is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn signup(
    username: &str,
    email: &str,
    password: &str,
    accept_terms: bool,
) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::Required("Username"));
    }
    check_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::Required("Password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    if !accept_terms {
        return Err(ValidationError::TermsNotAccepted);
    }
    Ok(())
}

pub fn login(email: &str, password: &str) -> Result<(), ValidationError> {
    check_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::Required("Password"));
    }
    Ok(())
}

pub fn task_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::Required("Task title"));
    }
    Ok(())
}

/// Empty input means "no due date".
pub fn due_date(input: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_rules() {
        assert_eq!(signup("ann", "ann@example.com", "hunter22", true), Ok(()));
        assert_eq!(
            signup(" ", "ann@example.com", "hunter22", true),
            Err(ValidationError::Required("Username"))
        );
        assert_eq!(
            signup("ann", "ann.example.com", "hunter22", true),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            signup("ann", "ann@ex ample.com", "hunter22", true),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            signup("ann", "ann@example.com", "12345", true),
            Err(ValidationError::PasswordTooShort(6))
        );
        assert_eq!(
            signup("ann", "ann@example.com", "123456", false),
            Err(ValidationError::TermsNotAccepted)
        );
    }

    #[test]
    fn test_login_rules() {
        assert_eq!(login("", "x"), Err(ValidationError::Required("Email")));
        assert_eq!(login("a@b", ""), Err(ValidationError::Required("Password")));
        assert_eq!(login("a@b", "x"), Ok(()));
    }

    #[test]
    fn test_task_title_and_due_date() {
        assert!(task_title("   ").is_err());
        assert!(task_title("Buy milk").is_ok());
        assert_eq!(due_date(""), Ok(None));
        assert_eq!(due_date("2024-02-29"), Ok(NaiveDate::from_ymd_opt(2024, 2, 29)));
        assert_eq!(
            due_date("2023-02-29"),
            Err(ValidationError::InvalidDate("2023-02-29".to_string()))
        );
    }
}
