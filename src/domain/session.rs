use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Role granted to a user by the server.
///
/// Unknown role strings are preserved so they round-trip through the cached profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    #[default]
    Viewer,
    Other(String),
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Viewer => "viewer",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Self::Admin,
            "viewer" => Self::Viewer,
            blank if blank.trim().is_empty() => Self::Viewer,
            _ => Self::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    #[must_use]
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            id: None,
            email: Some(email.into()),
            first_name: None,
            last_name: None,
            role: Some(role),
            extra: Map::new(),
        }
    }

    /// The user's role, or the least-privileged role when the server sent none.
    #[must_use]
    pub fn effective_role(&self) -> Role {
        self.role.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !full.is_empty() {
            return full;
        }
        match self.email.as_deref() {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => "User".to_string(),
        }
    }
}

/// Client-side authentication state.
///
/// Tokens live in persistent storage; the profile lives here. Both transitions go through
/// [`crate::storage::credentials::CredentialStore`], which keeps them in step.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated { user: UserProfile },
}

impl Session {
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { user } => Some(user),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.user().map(UserProfile::effective_role).unwrap_or_default()
    }
}
