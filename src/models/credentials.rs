use std::fmt;

/// Secrets handed verbatim to providers and the external tool.
#[derive(Clone, Default)]
pub struct Credentials {
    pub nexus_api_key: Option<String>,
    pub steam_api_key: Option<String>,
    pub steam_username: Option<String>,
    pub steam_password: Option<String>,
    pub steam_guard: Option<String>,
}

impl Credentials {
    pub fn steam_login(&self) -> Option<(&str, &str)> {
        let user = self.steam_username.as_deref().filter(|u| !u.is_empty())?;
        if user.eq_ignore_ascii_case("anonymous") {
            return None;
        }
        Some((user, self.steam_password.as_deref().unwrap_or_default()))
    }
}

// Never print secret material.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("nexus_api_key", &mask(&self.nexus_api_key))
            .field("steam_api_key", &mask(&self.steam_api_key))
            .field("steam_username", &self.steam_username)
            .field("steam_password", &mask(&self.steam_password))
            .field("steam_guard", &mask(&self.steam_guard))
            .finish()
    }
}
