use serde::{Deserialize, Serialize};

/// An opaque player identity.
///
/// The engine never interprets the name beyond equality and display; the
/// transport layer decides what it actually is (a chat handle, a websocket
/// session name, etc.).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Player {
    pub name: String,
}

impl Player {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Player { name: name.into() }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
