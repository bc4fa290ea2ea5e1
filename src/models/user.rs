use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A user row as selected by the API.
///
/// The bcrypt hash never serializes, and the token list and avatar bytes are
/// never selected into this struct at all, so no JSON read path can leak
/// them. The avatar has its own binary endpoint.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub age: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile update payload for `PATCH /users/me`.
///
/// `deny_unknown_fields` enforces the update whitelist: a payload naming any
/// other field fails deserialization before a single column is touched.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(custom = "crate::models::not_blank")]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 7), custom = "crate::auth::password_guard")]
    pub password: Option<String>,
    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_serialization_omits_credentials() {
        let user = User {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            age: 36,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
        assert!(json.get("tokens").is_none());
        assert!(json.get("avatar").is_none());
    }

    #[test]
    fn test_update_request_whitelist() {
        let valid: Result<UpdateUserRequest, _> =
            serde_json::from_value(serde_json::json!({ "name": "Ada", "age": 37 }));
        assert!(valid.is_ok());

        // Fields outside {name, email, password, age} fail deserialization.
        let unknown: Result<UpdateUserRequest, _> =
            serde_json::from_value(serde_json::json!({ "location": "London" }));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_update_request_validation() {
        let blank_name: UpdateUserRequest =
            serde_json::from_value(serde_json::json!({ "name": "   " })).unwrap();
        assert!(blank_name.validate().is_err());

        let negative_age: UpdateUserRequest =
            serde_json::from_value(serde_json::json!({ "age": -3 })).unwrap();
        assert!(negative_age.validate().is_err());

        let weak_password: UpdateUserRequest =
            serde_json::from_value(serde_json::json!({ "password": "Password123" })).unwrap();
        assert!(weak_password.validate().is_err());

        let fine: UpdateUserRequest =
            serde_json::from_value(serde_json::json!({ "password": "tr0ub4dor&3" })).unwrap();
        assert!(fine.validate().is_ok());
    }
}
