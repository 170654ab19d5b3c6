//! Registration and login forms with client-side validation

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;

/// Rejections raised before any identity call
///
/// Messages are shown to the user as is.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Vui lòng điền đầy đủ thông tin bắt buộc")]
    MissingFields,

    #[error("Email không đúng định dạng")]
    InvalidEmail,

    #[error("Mật khẩu phải có ít nhất 8 ký tự")]
    PasswordTooShort,

    #[error("Mật khẩu xác nhận không khớp")]
    PasswordMismatch,

    #[error("Vui lòng đồng ý với điều khoản sử dụng")]
    TermsNotAccepted,

    #[error("Vui lòng nhập đầy đủ email và mật khẩu")]
    MissingCredentials,
}

/// Minimum password length, in characters
pub const MIN_PASSWORD_CHARS: usize = 8;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Compiled once; a bad pattern is kept as its error instead of panicking
fn email_regex() -> Result<&'static Regex, &'static regex::Error> {
    static EMAIL: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN)).as_ref()
}

/// Loose shape check: something@something.something, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    match email_regex() {
        Ok(re) => re.is_match(email),
        Err(e) => {
            tracing::error!(error = %e, "Email pattern failed to compile");
            false
        }
    }
}

/// Sign-up form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub business: String,
    pub business_type: String,
    pub password: String,
    pub confirm_password: String,
    pub notes: String,
    pub terms: bool,
    pub newsletter: bool,
}

impl RegistrationForm {
    /// Checks run in order; the first failure wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.phone,
            &self.business,
            &self.password,
        ];
        if required.iter().any(|field| field.is_empty()) {
            return Err(ValidationError::MissingFields);
        }

        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }

        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ValidationError::PasswordTooShort);
        }

        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }

        if !self.terms {
            return Err(ValidationError::TermsNotAccepted);
        }

        Ok(())
    }

    /// Metadata stored on the identity record
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "first_name": self.first_name,
            "last_name": self.last_name,
            "phone": self.phone,
            "business": self.business,
            "business_type": self.business_type,
        })
    }
}

/// Sign-in form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember: bool,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern_compiles() {
        if let Err(e) = email_regex() {
            panic!("email pattern does not compile: {e}");
        }
        assert!(is_valid_email("chu.quan@cafe.vn"));
        assert!(!is_valid_email("chu quan@cafe.vn"));
        assert!(!is_valid_email("chuquan@cafe"));
    }

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            first_name: "An".to_string(),
            last_name: "Nguyễn".to_string(),
            email: "an@quan.vn".to_string(),
            phone: "0900000000".to_string(),
            business: "Café A".to_string(),
            business_type: "cafe".to_string(),
            password: "matkhau1".to_string(),
            confirm_password: "matkhau1".to_string(),
            terms: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_form_passes() {
        assert_eq!(valid_form().validate(), Ok(()));
    }

    #[test]
    fn test_each_required_field() {
        let clears: [fn(&mut RegistrationForm); 6] = [
            |f| f.first_name.clear(),
            |f| f.last_name.clear(),
            |f| f.email.clear(),
            |f| f.phone.clear(),
            |f| f.business.clear(),
            |f| f.password.clear(),
        ];
        for clear in clears {
            let mut form = valid_form();
            clear(&mut form);
            assert_eq!(form.validate(), Err(ValidationError::MissingFields));
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(!is_valid_email("a@b"));
        assert!(is_valid_email("a@b.c"));
        assert!(!is_valid_email("a b@c.d"));

        let mut form = valid_form();
        form.email = "a@b".to_string();
        assert_eq!(form.validate(), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_password_length_counts_characters() {
        let mut form = valid_form();
        form.password = "1234567".to_string();
        form.confirm_password = form.password.clone();
        assert_eq!(form.validate(), Err(ValidationError::PasswordTooShort));

        form.password = "aaaaaaaa".to_string();
        form.confirm_password = form.password.clone();
        assert_eq!(form.validate(), Ok(()));

        // Eight non-ASCII characters are enough.
        form.password = "mậtkhẩuư".to_string();
        form.confirm_password = form.password.clone();
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn test_mismatch_and_terms() {
        let mut form = valid_form();
        form.confirm_password = "khac12345".to_string();
        assert_eq!(form.validate(), Err(ValidationError::PasswordMismatch));

        let mut form = valid_form();
        form.terms = false;
        assert_eq!(form.validate(), Err(ValidationError::TermsNotAccepted));
    }

    #[test]
    fn test_camel_case_fields() {
        let form: RegistrationForm = serde_json::from_str(
            r#"{"firstName": "An", "confirmPassword": "x", "terms": true}"#,
        )
        .unwrap();
        assert_eq!(form.first_name, "An");
        assert_eq!(form.confirm_password, "x");
        assert!(form.terms);
    }

    #[test]
    fn test_login_presence() {
        assert_eq!(
            LoginForm::new("", "x").validate(),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(LoginForm::new("a@b.c", "x").validate(), Ok(()));
    }
}
