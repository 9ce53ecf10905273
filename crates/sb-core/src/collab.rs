//! Narrow interfaces to the outside world. The engine depends on neither;
//! binaries wire concrete implementations in.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::book::SkillBook;

/// Durable storage for a whole skill book.
pub trait PersistenceStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load_book(&self) -> Result<SkillBook, Self::Error>;
    fn save_book(&self, book: &SkillBook) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Discord,
    Github,
}

impl AuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthProvider::Google => "google",
            AuthProvider::Discord => "discord",
            AuthProvider::Github => "github",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Some(AuthProvider::Google),
            "discord" => Some(AuthProvider::Discord),
            "github" => Some(AuthProvider::Github),
            _ => None,
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity attached to this skill book, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub provider: AuthProvider,
    pub handle: String,
    pub display_name: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Sign-in/out and current-user query, delegated to an external service.
pub trait IdentityProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    fn sign_in(&self, provider: AuthProvider, handle: &str) -> Result<UserIdentity, Self::Error>;
    fn sign_out(&self) -> Result<(), Self::Error>;
    fn current_user(&self) -> Result<Option<UserIdentity>, Self::Error>;
}
