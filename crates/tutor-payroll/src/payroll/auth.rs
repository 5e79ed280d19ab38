use axum::http::HeaderMap;

use crate::config::AdminConfig;

pub const ADMIN_HEADER: &str = "x-admin-password";

/// Decides whether a presented admin credential is acceptable.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, presented: &str) -> bool;
}

/// Compares against one configured secret.
#[derive(Clone)]
pub struct SharedSecretVerifier {
    secret: Vec<u8>,
}

impl SharedSecretVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into().into_bytes(),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(config.secret.clone())
    }
}

impl CredentialVerifier for SharedSecretVerifier {
    fn verify(&self, presented: &str) -> bool {
        let presented = presented.as_bytes();
        if self.secret.is_empty() || presented.len() != self.secret.len() {
            return false;
        }
        presented
            .iter()
            .zip(&self.secret)
            .fold(0u8, |diff, (left, right)| diff | (left ^ right))
            == 0
    }
}

/// Credential from the admin header, falling back to the `adminPassword` query parameter.
pub fn presented_credential(headers: &HeaderMap, query_value: Option<&str>) -> Option<String> {
    headers
        .get(ADMIN_HEADER)
        .and_then(|value| value.to_str().ok())
        .or(query_value)
        .map(str::to_string)
}
