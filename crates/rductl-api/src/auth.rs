use secrecy::SecretString;

/// Username/password pair used to open a gateway session.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// What the gateway tells us about itself on login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    /// RDU software version, when the gateway reports it.
    pub server_version: Option<String>,
}
