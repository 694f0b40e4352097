use serde::{Deserialize, Serialize};

/// Platform operator account. Not tied to any tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: String,
}

pub const DEFAULT_ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

impl NewAdminUser {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            role: DEFAULT_ADMIN_ROLE.to_string(),
        }
    }

    pub fn validate(self) -> Result<Self, AdminUserError> {
        let email = self.email.trim().to_ascii_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AdminUserError::InvalidInput(format!(
                "Invalid email address: '{}'",
                self.email
            )));
        }
        if self.password_hash.is_empty() {
            return Err(AdminUserError::InvalidInput(
                "Password hash cannot be empty".into(),
            ));
        }
        Ok(Self { email, ..self })
    }

    pub fn into_admin_user(self, id: i64) -> AdminUser {
        AdminUser {
            id,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AdminUserError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
