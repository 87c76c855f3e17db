//! Placeholder sign-in state. Not a security mechanism: it only decides whose
//! name is stamped on new posts.

use thiserror::Error;

use crate::domain::{error::DomainError, identity::Identity};

pub const DEFAULT_USERNAME: &str = "username";
pub const DEFAULT_PASSWORD: &str = "Interesting123-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Validation(#[from] DomainError),
}

/// The single fixed credential pair accepted by `login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignupForm<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// Holds at most one signed-in identity.
#[derive(Debug, Clone, Default)]
pub struct Session {
    credentials: Credentials,
    current: Option<Identity>,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            current: None,
        }
    }

    pub fn login(&mut self, identifier: &str, secret: &str) -> Result<&Identity, SessionError> {
        if identifier.is_empty() {
            return Err(DomainError::required("username").into());
        }
        if secret.is_empty() {
            return Err(DomainError::required("password").into());
        }
        if identifier != self.credentials.username || secret != self.credentials.password {
            tracing::debug!(username = identifier, "Login rejected");
            return Err(SessionError::InvalidCredentials);
        }

        let identity = Identity::new(identifier)?;
        Ok(&*self.current.insert(identity))
    }

    pub fn signup(&mut self, form: &SignupForm<'_>) -> Result<&Identity, SessionError> {
        let fields = [
            ("name", form.name),
            ("email", form.email),
            ("password", form.password),
            ("confirm_password", form.confirm_password),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(DomainError::required(*field).into());
        }
        if form.password != form.confirm_password {
            return Err(DomainError::PasswordMismatch.into());
        }

        let identity = Identity::new(form.name)?;
        Ok(&*self.current.insert(identity))
    }

    pub fn logout(&mut self) {
        self.current = None;
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    /// Identity to stamp on new posts; anonymous sessions post as the guest.
    pub fn author(&self) -> Identity {
        self.current.clone().unwrap_or_else(Identity::guest)
    }
}
