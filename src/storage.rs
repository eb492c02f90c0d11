//! Registered credentials and the store that owns them.

use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::{
    attestation::AttestationStatementFormat,
    crypto::CoseKey,
    types::{Aaguid, CredentialId, UserHandle},
};

/// A credential registered with the relying party.
/// [See more](https://www.w3.org/TR/webauthn/#credential-record)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: CredentialId,
    pub owner: UserHandle,
    /// Stored in canonical COSE form
    pub public_key: CoseKey,
    pub sign_count: u32,
    pub aaguid: Aaguid,
    pub attestation_format: AttestationStatementFormat,
}

/// Persistent storage of credentials.
///
/// Implementations must make [save_credential](CredentialStore::save_credential)
/// and [update_sign_count](CredentialStore::update_sign_count) atomic with
/// respect to other calls for the same credential id.
pub trait CredentialStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn find_credential(&self, id: &CredentialId) -> Result<Option<Credential>, Self::Error>;

    /// Stores a new credential. Returns `false` without storing anything if a
    /// credential with the same id exists.
    fn save_credential(&self, credential: Credential) -> Result<bool, Self::Error>;

    /// Sets the sign count of credential `id` to `new` if it is currently
    /// `expected`. Returns whether the update happened.
    fn update_sign_count(&self, id: &CredentialId, expected: u32, new: u32) -> Result<bool, Self::Error>;
}

/// An in-memory [CredentialStore].
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<HashMap<CredentialId, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CredentialId, Credential>> {
        // updates are single inserts or assignments, a poisoned map is still consistent
        self.credentials.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    type Error = Infallible;

    fn find_credential(&self, id: &CredentialId) -> Result<Option<Credential>, Self::Error> {
        Ok(self.lock().get(id).cloned())
    }

    fn save_credential(&self, credential: Credential) -> Result<bool, Self::Error> {
        let mut credentials = self.lock();
        if credentials.contains_key(&credential.id) {
            return Ok(false);
        }
        credentials.insert(credential.id.clone(), credential);
        Ok(true)
    }

    fn update_sign_count(&self, id: &CredentialId, expected: u32, new: u32) -> Result<bool, Self::Error> {
        let mut credentials = self.lock();
        match credentials.get_mut(id) {
            Some(credential) if credential.sign_count == expected => {
                credential.sign_count = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
