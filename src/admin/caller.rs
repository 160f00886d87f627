//! Caller identity attached to an incoming administrative request.

use std::collections::HashMap;

/// Identity variables forwarded with the request (e.g. OIDC claims placed in
/// request metadata by an authenticating proxy):
///
/// ```json
/// {
///   "name": "Jane Operator",
///   "email": "jane@example.net",
///   "groups": "netops,admins",
///   "at_hash": "Zq1Uv3..."
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Caller {
    variables: HashMap<String, String>,
}

impl Caller {
    /// An anonymous caller.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    /// The caller's display name. Absent or empty means anonymous.
    pub fn name(&self) -> Option<&str> {
        self.get("name").filter(|name| !name.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.get("email")
    }

    /// Group memberships, from a comma- or space-separated list.
    pub fn groups(&self) -> Vec<&str> {
        self.get("groups")
            .map(|groups| {
                groups
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|g| !g.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Hash of the access token the identity was derived from.
    pub fn token_hash(&self) -> Option<&str> {
        self.get("at_hash")
    }

    pub fn is_identified(&self) -> bool {
        self.name().is_some()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }
}
