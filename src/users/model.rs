use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User as sent to the identity provider. Equality and hashing use the id only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    #[schema(example = "0b9e3d2c-8f1f-4bb6-9a51-3c2f6c7d9e10")]
    pub id: Option<String>,

    #[schema(example = "alice@example.com")]
    pub email: Option<String>,

    #[schema(example = "alice")]
    pub username: Option<String>,

    #[serde(skip_serializing)]
    #[schema(example = "changeme", write_only)]
    pub password: Option<String>,
}

impl PartialEq for UserDto {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UserDto {}

impl Hash for UserDto {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for UserDto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn user(id: &str, username: &str) -> UserDto {
        UserDto {
            id: Some(id.to_string()),
            email: Some(format!("{}@example.com", username)),
            username: Some(username.to_string()),
            password: Some("pw".to_string()),
        }
    }

    #[test]
    fn test_equality_uses_id_only() {
        assert_eq!(user("1", "alice"), user("1", "bob"));
        assert_ne!(user("1", "alice"), user("2", "alice"));

        let set: HashSet<UserDto> = [user("1", "alice"), user("1", "bob")].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display_is_username() {
        assert_eq!(user("1", "alice").to_string(), "alice");
    }

    #[test]
    fn test_password_is_never_serialized() {
        let json = serde_json::to_value(user("1", "alice")).unwrap();
        assert!(json.get("password").is_none());

        let parsed: UserDto =
            serde_json::from_str(r#"{"email":"a@b.c","username":"a","password":"pw"}"#).unwrap();
        assert_eq!(parsed.password.as_deref(), Some("pw"));
    }
}
