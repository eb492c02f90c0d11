//! Identifier newtypes shared by the codec, the attestation verifiers and the
//! ceremonies.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a credential.
/// [See more](https://w3c.github.io/webauthn/#credential-id)
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialId(#[serde(with = "serde_bytes")] pub Vec<u8>);

impl fmt::Debug for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialId({})", hex::encode(&self.0))
    }
}

impl AsRef<[u8]> for CredentialId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for CredentialId {
    fn from(id: &[u8]) -> Self {
        CredentialId(id.to_vec())
    }
}

/// Identifies a user's account within a particular RP.
/// [See more](https://w3c.github.io/webauthn/#dom-publickeycredentialuserentity-id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserHandle(#[serde(with = "serde_bytes")] pub Vec<u8>);

/// https://www.w3.org/TR/webauthn-2/#aaguid
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Aaguid(pub [u8; 16]);

impl fmt::Debug for Aaguid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aaguid({})", hex::encode(self.0))
    }
}

/// SHA-256 digest of the client data JSON, computed by the caller.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ClientDataHash(pub [u8; 32]);

impl fmt::Debug for ClientDataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientDataHash({})", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for ClientDataHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A user account as known to the relying party.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserHandle,
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}
