use serde::Serialize;

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: String,
}

/// Maximum email length per RFC 5321.
const MAX_EMAIL_LENGTH: usize = 254;

/// Validate an email address format.
///
/// Practical checks consistent with RFC 5322 basics:
/// - Non-empty, no whitespace, reasonable length
/// - Exactly one `@` with non-empty local part and domain
/// - Domain contains at least one `.` and does not start/end with `.` or `-`
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is empty".to_string());
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        ));
    }

    if email.contains(char::is_whitespace) {
        return Err("Email contains whitespace".to_string());
    }

    if email.matches('@').count() != 1 {
        return Err("Email must contain exactly one '@'".to_string());
    }

    let (local, domain) = email.split_once('@').unwrap_or((email, ""));

    if local.is_empty() {
        return Err("Email local part is empty".to_string());
    }

    if domain.is_empty() {
        return Err("Email domain is empty".to_string());
    }

    if !domain.contains('.') {
        return Err("Email domain must contain at least one '.'".to_string());
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return Err("Email domain cannot start or end with '.'".to_string());
    }

    if domain.starts_with('-') || domain.ends_with('-') {
        return Err("Email domain cannot start or end with '-'".to_string());
    }

    Ok(())
}

/// Validate a phone number: exactly 10 ASCII digits, no separators.
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.chars().count() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number must be exactly 10 digits".to_string());
    }
    Ok(())
}

/// Validate a PAN: 5 uppercase letters, 4 digits, 1 uppercase letter.
/// Case-sensitive, no trimming.
pub fn validate_pan(pan: &str) -> Result<(), String> {
    let chars: Vec<char> = pan.chars().collect();
    let ok = chars.len() == 10
        && chars[..5].iter().all(|c| c.is_ascii_uppercase())
        && chars[5..9].iter().all(|c| c.is_ascii_digit())
        && chars[9].is_ascii_uppercase();

    if !ok {
        return Err("Invalid PAN format".to_string());
    }
    Ok(())
}

/// Run every field rule over a candidate record and collect all failures.
/// An empty result means the record is valid. Uniqueness is not checked here;
/// that is the store's job.
pub fn validate_user(
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: &str,
    pan: &str,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if first_name.trim().is_empty() {
        errors.push(FieldError {
            field: "first_name",
            error: "First name must not be empty".to_string(),
        });
    }

    if last_name.trim().is_empty() {
        errors.push(FieldError {
            field: "last_name",
            error: "Last name must not be empty".to_string(),
        });
    }

    if let Err(error) = validate_email(email) {
        errors.push(FieldError {
            field: "email",
            error,
        });
    }

    if let Err(error) = validate_phone(phone) {
        errors.push(FieldError {
            field: "phone",
            error,
        });
    }

    if let Err(error) = validate_pan(pan) {
        errors.push(FieldError {
            field: "pan",
            error,
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());
        assert!(validate_email("a@b.c").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("").is_err());
        assert!(validate_email("noatsign").is_err());
        assert!(validate_email("@domain.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("user @domain.com").is_err());
        assert!(validate_email("user@@domain.com").is_err());
        assert!(validate_email("user@.domain.com").is_err());
        assert!(validate_email("user@domain.com.").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("1234567890").is_ok());
        assert!(validate_phone("123456789").is_err()); // 9 digits
        assert!(validate_phone("12345678901").is_err()); // 11 digits
        assert!(validate_phone("123-456-78").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_validate_pan() {
        assert!(validate_pan("ABCDE1234F").is_ok());
        assert!(validate_pan("abcde1234f").is_err()); // lowercase
        assert!(validate_pan("ABCD1234F").is_err()); // 9 characters
        assert!(validate_pan("ABCDE12345").is_err()); // no trailing letter
        assert!(validate_pan("ABCDE1234FX").is_err()); // 11 characters
        assert!(validate_pan(" ABCDE1234F").is_err()); // no trimming
    }

    #[test]
    fn test_validate_user_accepts_valid_record() {
        let errors = validate_user("Asha", "Rao", "asha@example.com", "9876543210", "ABCDE1234F");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_validate_user_cites_each_invalid_field() {
        let errors = validate_user("", "Rao", "asha@example.com", "9876543210", "ABCDE1234F");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "first_name");

        let errors = validate_user("Asha", "  ", "asha@example.com", "9876543210", "ABCDE1234F");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "last_name");

        let errors = validate_user("Asha", "Rao", "not-an-email", "9876543210", "ABCDE1234F");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");

        let errors = validate_user("Asha", "Rao", "asha@example.com", "987654321", "ABCDE1234F");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "phone");

        let errors = validate_user("Asha", "Rao", "asha@example.com", "9876543210", "abcde1234f");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "pan");
    }

    #[test]
    fn test_validate_user_reports_all_failures() {
        let errors = validate_user("", "", "bad", "123", "nope");
        assert_eq!(errors.len(), 5);
    }
}
