// Authentication data models

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pricing::UserCategory;

/// Role granted by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Attendee,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Attendee => write!(f, "attendee"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "attendee" => Ok(Role::Attendee),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// JWT claims structure
///
/// The attendee category is fixed when the account is created, so it
/// travels inside the token rather than in request bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id at the identity provider
    pub email: String,
    pub category: UserCategory,
    pub role: Role,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_display_and_parse() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::from_str("ATTENDEE").unwrap(), Role::Attendee);
        assert!(Role::from_str("staff").is_err());
    }

    #[test]
    fn test_claims_serialization() {
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "a@example.com".to_string(),
            category: UserCategory::PgsFellow,
            role: Role::Attendee,
            exp: 10,
            iat: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["category"], "PGS_FELLOW");
        assert_eq!(json["role"], "attendee");
    }
}
