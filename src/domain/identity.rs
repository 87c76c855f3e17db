//! Author identities stamped onto new posts.

use crate::domain::error::DomainError;

pub const GUEST_DISPLAY_NAME: &str = "Guest User";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    display_name: String,
    initial: char,
}

impl Identity {
    /// Build an identity from a display name; the initial is its first character, uppercased.
    pub fn new(display_name: impl Into<String>) -> Result<Self, DomainError> {
        let display_name = display_name.into().trim().to_string();
        let initial = initial_for(&display_name).ok_or_else(|| DomainError::required("name"))?;
        Ok(Self {
            display_name,
            initial,
        })
    }

    pub fn guest() -> Self {
        Self {
            display_name: GUEST_DISPLAY_NAME.to_string(),
            initial: 'G',
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn initial(&self) -> char {
        self.initial
    }
}

fn initial_for(name: &str) -> Option<char> {
    let first = name.chars().next()?;
    first.to_uppercase().next()
}
