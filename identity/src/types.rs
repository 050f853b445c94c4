//! Wire and session types for the identity authority (Keyrock-style API).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role id the authority assigns to the owners of an application.
pub const PROVIDER_ROLE_ID: &str = "provider";

/// Header carrying the session token on login responses.
pub const SUBJECT_TOKEN_HEADER: &str = "x-subject-token";

/// Header carrying the session token on authenticated requests.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Where and as whom the client logs in.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub url: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// A session token obtained at login.
///
/// Lives as long as the client that obtained it. It is never persisted and
/// never renewed.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session(***)")
    }
}

/// A role held by a user on an application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleAssignment {
    pub role_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub oauth_client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleAssignments {
    #[serde(default)]
    pub role_user_assignments: Vec<RoleAssignment>,
}

/// A role registered in an application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Roles {
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_not_debug_printed() {
        let config = IdentityConfig {
            url: "http://idm".to_string(),
            user: "idm".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
        assert_eq!(format!("{:?}", Session::new("tok")), "Session(***)");
    }

    #[test]
    fn test_assignments_tolerate_missing_fields() {
        let parsed: RoleAssignments = serde_json::from_str(
            r#"{"role_user_assignments": [{"role_id": "provider", "user_id": "alice"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.role_user_assignments[0].role_id, PROVIDER_ROLE_ID);

        let empty: RoleAssignments = serde_json::from_str("{}").unwrap();
        assert!(empty.role_user_assignments.is_empty());
    }
}
