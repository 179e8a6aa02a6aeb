use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a platform user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            discriminator: None,
            global_name: None,
            bot: false,
        }
    }

    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = Some(discriminator.into());
        self
    }

    pub fn as_bot(mut self) -> Self {
        self.bot = true;
        self
    }

    /// `name#1234` for legacy accounts, the bare username otherwise
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if !d.is_empty() && d != "0" => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A guild (server) the bot is a member of
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "approximate_member_count")]
    pub member_count: u64,
}

impl Guild {
    pub fn new(id: impl Into<String>, name: impl Into<String>, member_count: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            member_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_with_legacy_discriminator() {
        let user = User::new("1", "alice").with_discriminator("0420");
        assert_eq!(user.tag(), "alice#0420");
    }

    #[test]
    fn test_tag_with_migrated_username() {
        let user = User::new("1", "alice").with_discriminator("0");
        assert_eq!(user.tag(), "alice");
        assert_eq!(User::new("2", "bob").to_string(), "bob");
    }
}
