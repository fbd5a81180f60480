//! Principal (caller identity) types.
//!
//! A [`Principal`] represents who is making a call, separating "who is
//! calling" from "what they are allowed to do". Permission decisions are
//! made by guards in `rpcc-auth`, which read the principal from the
//! call context.

use serde::{Deserialize, Serialize};

/// The authenticated caller of an operation.
///
/// The transport collaborator authenticates the caller and places the
/// resulting principal in the call context. An unauthenticated call
/// carries no principal at all.
///
/// # Variants
///
/// | Variant | Description | Typical Use |
/// |---------|-------------|-------------|
/// | `User` | Named account | Interactive and scripted API clients |
/// | `System` | Internal caller | Startup tasks, maintenance jobs |
///
/// # Example
///
/// ```
/// use rpcc_types::Principal;
///
/// let alice = Principal::user("alice");
/// assert!(alice.is_user());
/// assert_eq!(alice.to_string(), "user:alice");
///
/// assert!(Principal::System.is_system());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Principal {
    /// A named user account.
    User(String),

    /// Internal operations not attributable to a user.
    System,
}

impl Principal {
    /// Creates a [`Principal::User`].
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self::User(name.into())
    }

    /// Returns `true` if this is a [`Principal::User`].
    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// Returns `true` if this is [`Principal::System`].
    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }

    /// Returns the user name if this is a User, otherwise `None`.
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        match self {
            Self::User(name) => Some(name),
            Self::System => None,
        }
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(name) => write!(f, "user:{name}"),
            Self::System => write!(f, "system"),
        }
    }
}
