use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// User entity - a registered account
///
/// The password travels through the API verbatim. Hashing is intentionally
/// out of scope for this service, so the field is stored and echoed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// System-assigned surrogate key
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Display handle, intended unique but not enforced
    pub user_name: String,
    /// Stored with the casing the user submitted; uniqueness is
    /// case-insensitive
    pub email: String,
    pub password: String,
}

/// DTO for signing up a new user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub user_name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub password: String,
}

impl User {
    /// Build a user from a signup request and an assigned id
    pub fn from_create(id: i32, input: CreateUser) -> Self {
        Self {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            user_name: input.user_name,
            email: input.email,
            password: input.password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreateUser {
        CreateUser {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            user_name: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_valid_input_passes_validation() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn test_malformed_email_fails_validation() {
        let mut input = valid_input();
        input.email = "not-an-email".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_empty_email_fails_validation() {
        let mut input = valid_input();
        input.email = String::new();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_empty_user_name_fails_validation() {
        let mut input = valid_input();
        input.user_name = String::new();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User::from_create(1, valid_input());
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["userName"], "ada");
        assert!(json.get("first_name").is_none());
    }
}
