pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::User;

// Re-export the pieces handlers actually touch.
pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Rejects passwords containing the word "password" in any casing.
pub fn password_guard(password: &str) -> Result<(), ValidationError> {
    if password.to_lowercase().contains("password") {
        let mut err = ValidationError::new("password");
        err.message = Some("Password cannot contain \"password\"".into());
        return Err(err);
    }
    Ok(())
}

/// Payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7))]
    pub password: String,
}

/// Payload for a new account registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom = "crate::models::not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: String,
    /// At least 7 characters, and must not contain "password".
    #[validate(length(min = 7), custom = "password_guard")]
    pub password: String,
    /// Non-negative; treated as 0 when absent.
    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: Option<i32>,
}

/// Response after successful registration or login: the profile plus the
/// freshly issued session token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}
