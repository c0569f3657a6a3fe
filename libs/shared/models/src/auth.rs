use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Platform role carried in the token, if it names one we know.
    pub fn platform_role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.platform_role() == Some(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(alias = "patient")]
    Patient,
    #[serde(alias = "doctor")]
    Doctor,
    #[serde(alias = "admin")]
    Admin,
    #[serde(alias = "lab")]
    Lab,
    #[serde(alias = "shop")]
    Shop,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "Patient"),
            Role::Doctor => write!(f, "Doctor"),
            Role::Admin => write!(f, "Admin"),
            Role::Lab => write!(f, "Lab"),
            Role::Shop => write!(f, "Shop"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            "lab" => Ok(Role::Lab),
            "shop" | "pharmacy" => Ok(Role::Shop),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: Option<&str>) -> User {
        User {
            id: "u-1".to_string(),
            email: None,
            role: role.map(str::to_string),
            metadata: None,
            created_at: None,
        }
    }

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("Patient".parse::<Role>(), Ok(Role::Patient));
        assert_eq!("DOCTOR".parse::<Role>(), Ok(Role::Doctor));
        assert_eq!("pharmacy".parse::<Role>(), Ok(Role::Shop));
        assert!("authenticated".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_role_helpers() {
        assert!(user_with_role(Some("admin")).is_admin());
        assert!(user_with_role(Some("Lab")).has_role(Role::Lab));
        assert_eq!(user_with_role(Some("authenticated")).platform_role(), None);
        assert_eq!(user_with_role(None).platform_role(), None);
    }
}
