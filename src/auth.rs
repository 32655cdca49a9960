//! Login and registration payloads. Passwords are encrypted with the
//! server's public key before they are sent; the cipher itself sits
//! behind `client::Encryptor`.

use serde::{Deserialize, Serialize};

const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";

/// Turn a base64 SPKI body (possibly wrapped, indented, or already a PEM
/// block) into a single-line-body PEM block.
pub fn normalize_public_key(raw: &str) -> String {
    let body: String = raw
        .replace(PEM_HEADER, "")
        .replace(PEM_FOOTER, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    format!("{PEM_HEADER}\n{body}\n{PEM_FOOTER}")
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Body actually posted: the password field holds ciphertext.
#[derive(Debug, Serialize)]
pub(crate) struct EncryptedCredentials<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    pub username: &'a str,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PublicKeyResponse {
    pub public_key: String,
}
