// Common validation types and traits

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Turns an invalid result into an error, passing valid results through
    pub fn into_result(self) -> Result<(), super::ApiError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

/// Password rules applied at signup and password reset
pub fn validate_new_password(password: &str, confirmation: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if password != confirmation {
        result.add_error("password2", "Passwords don't match");
    }
    if password.chars().count() < 8 {
        result.add_error(
            "password",
            "This password is too short. It must contain at least 8 characters.",
        );
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        result.add_error("password", "This password is entirely numeric.");
    }

    result
}
