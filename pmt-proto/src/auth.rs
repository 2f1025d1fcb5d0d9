//! Login and signup payloads.
//!
//! Passwords travel in the `mdp` field and never appear in [`User`].

use serde::{Deserialize, Serialize};

use crate::user::User;
use crate::validate::{ValidationError, check_password, require};

/// `POST /user/login` body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account e-mail.
    pub email: String,
    /// Plain password.
    #[serde(rename = "mdp")]
    pub password: String,
}

impl LoginRequest {
    /// Checks that both fields are filled in.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] naming the first blank field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("email", &self.email)?;
        require("password", &self.password)
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// `POST /user/login` answer. A rejected login is `success: false` with no
/// user, not an HTTP error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Whether the credentials matched.
    pub success: bool,
    /// The authenticated user on success.
    #[serde(default)]
    pub user: Option<User>,
}

/// `POST /user` body (account creation).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Display name.
    #[serde(rename = "nom")]
    pub name: String,
    /// Account e-mail.
    pub email: String,
    /// Plain password.
    #[serde(rename = "mdp")]
    pub password: String,
}

impl SignupRequest {
    /// Checks mandatory fields and the password length.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`ValidationError`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("email", &self.email)?;
        require("name", &self.name)?;
        check_password(&self.password)
    }
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}
