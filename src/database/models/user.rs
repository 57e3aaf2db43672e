use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum UserRole {
        Admin => "ADMIN",
        Hr => "HR",
        #[default]
        Employee => "EMPLOYEE",
    }
}

impl UserRole {
    /// ADMIN and HR may act on any employee's records.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Hr)
    }
}

impl User {
    pub fn new(email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(&email),
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Emails are stored trimmed and lower-cased so uniqueness is case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(UserRole::from_str("hr").unwrap(), UserRole::Hr);
        assert_eq!(UserRole::from_str(" Admin ").unwrap(), UserRole::Admin);
        assert!(UserRole::from_str("manager").is_err());
    }

    #[test]
    fn role_serializes_upper_case() {
        let json = serde_json::to_string(&UserRole::Hr).unwrap();
        assert_eq!(json, "\"HR\"");
    }

    #[test]
    fn staff_roles() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Hr.is_staff());
        assert!(!UserRole::Employee.is_staff());
    }

    #[test]
    fn new_user_normalizes_email() {
        let user = User::new("  Jane.Doe@Example.COM ".into(), "hash".into(), UserRole::Employee);
        assert_eq!(user.email, "jane.doe@example.com");
    }
}
