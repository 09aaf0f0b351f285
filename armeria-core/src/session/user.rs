//! Session user model
//!
//! The backend has shipped role assignments in several shapes over time
//! (`"ADMIN"`, `{"codigo": "ADMIN"}`, `{"rol": {"codigo": "ADMIN"}}`). They
//! are normalized once, at deserialization, into [`RoleAssignment`]; nothing
//! downstream looks at the raw shape again.

use crate::registry::normalize_role_code as normalize_code;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend user identifier (numeric or string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId::Number(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId::Text(id.to_string())
    }
}

/// One role held by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRole")]
pub struct RoleAssignment {
    /// Normalized role code (trimmed, upper case)
    pub code: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl RoleAssignment {
    pub fn new(code: &str) -> Self {
        Self { code: normalize_code(code), name: None, description: None }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

#[derive(Deserialize)]
struct RoleFields {
    #[serde(alias = "codigo")]
    code: String,
    #[serde(default, alias = "nombre")]
    name: Option<String>,
    #[serde(default, alias = "descripcion")]
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRole {
    Code(String),
    Nested {
        #[serde(alias = "rol")]
        role: RoleFields,
    },
    Flat(RoleFields),
}

impl From<RawRole> for RoleAssignment {
    fn from(raw: RawRole) -> Self {
        let fields = match raw {
            RawRole::Code(code) => return RoleAssignment::new(&code),
            RawRole::Nested { role } => role,
            RawRole::Flat(fields) => fields,
        };
        RoleAssignment {
            code: normalize_code(&fields.code),
            name: fields.name,
            description: fields.description,
        }
    }
}

/// The authenticated principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default, alias = "nombres")]
    pub first_name: String,
    #[serde(default, alias = "apellidos")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    #[serde(default, alias = "foto")]
    pub photo: Option<String>,
    /// Ordered as returned by the backend
    #[serde(default)]
    pub roles: Vec<RoleAssignment>,
}

impl SessionUser {
    /// "First Last", or the email when no name is known
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name).trim().to_string();
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }

    pub fn has_role(&self, code: &str) -> bool {
        let code = normalize_code(code);
        self.roles.iter().any(|r| r.code == code)
    }

    pub fn has_any_role<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        codes.iter().any(|c| self.has_role(c.as_ref()))
    }

    pub fn role_codes(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.code.as_str()).collect()
    }
}

/// Email/password pair sent to `POST /auth/login`
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Answer of `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    /// User summary embedded in the login answer
    #[serde(default, alias = "usuario")]
    pub user: Option<SessionUser>,
}

/// Partial profile update sent to `PUT /users/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl ProfileUpdate {
    /// Apply the present fields onto a user (used by the offline backend)
    pub fn apply_to(&self, user: &mut SessionUser) {
        if let Some(v) = &self.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            user.email = v.clone();
        }
        if let Some(v) = &self.phone {
            user.phone = Some(v.clone());
        }
        if let Some(v) = &self.photo {
            user.photo = Some(v.clone());
        }
    }
}
