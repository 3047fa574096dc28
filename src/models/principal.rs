use serde::{Deserialize, Serialize};

/// The authenticated identity behind a token or session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The unique identifier for the user.
    pub id: String,
    /// The user's username.
    pub username: String,
    /// The user's role.
    pub role: String,
}

/// The single demo account accepted by the login forms.
pub mod fixture {
    pub const ID: &str = "1";
    pub const USERNAME: &str = "user";
    pub const PASSWORD: &str = "password";
    pub const ROLE: &str = "user";
}

impl Principal {
    /// The principal of the demo account.
    pub fn fixture() -> Self {
        Self {
            id: fixture::ID.to_string(),
            username: fixture::USERNAME.to_string(),
            role: fixture::ROLE.to_string(),
        }
    }
}
