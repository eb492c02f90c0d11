//! Relying party settings and the configuration handed to the ceremony engine.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    attestation::{AttestationRegistry, AttestationStatementFormat},
    crypto::{supported_key_algorithms, CoseAlgorithm},
    error::{ErrorKind, Result},
    extensions::{verify_app_id, ExtensionValidator, APP_ID},
};

/// Bytes of randomness in a challenge unless configured otherwise.
pub const DEFAULT_CHALLENGE_LENGTH: usize = 32;

/// Challenges shorter than this are rejected.
/// [See more](https://www.w3.org/TR/webauthn/#sctn-cryptographic-challenges)
pub const MIN_CHALLENGE_LENGTH: usize = 16;

/// The relying party a ceremony runs for.
/// [See more](https://www.w3.org/TR/webauthn/#relying-party)
pub trait RelyingParty: Send + Sync {
    /// The RP ID, a valid domain string.
    fn id(&self) -> &str;

    /// Human-palatable name shown by authenticators.
    fn name(&self) -> &str;

    fn user_verification_required(&self) -> bool {
        false
    }

    /// Attestation formats accepted at registration. Empty means any format
    /// with a registered verifier.
    fn allowed_attestation_formats(&self) -> &[AttestationStatementFormat] {
        &[]
    }
}

/// A [RelyingParty] loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelyingPartyConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub require_user_verification: bool,
    #[serde(default)]
    pub attestation_formats: Vec<AttestationStatementFormat>,
}

impl RelyingPartyConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        RelyingPartyConfig {
            id: id.into(),
            name: name.into(),
            require_user_verification: false,
            attestation_formats: vec![],
        }
    }
}

impl RelyingParty for RelyingPartyConfig {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn user_verification_required(&self) -> bool {
        self.require_user_verification
    }

    fn allowed_attestation_formats(&self) -> &[AttestationStatementFormat] {
        &self.attestation_formats
    }
}

/// Configuration of a [CeremonyEngine](crate::CeremonyEngine), fixed when the
/// engine is constructed.
#[derive(Clone)]
pub struct CeremonyConfig {
    /// Credential algorithms offered at registration, most preferred first.
    pub algorithms: Vec<CoseAlgorithm>,
    pub attestation: AttestationRegistry,
    /// Validators for client extension outputs, by extension identifier.
    pub extension_validators: HashMap<String, ExtensionValidator>,
    pub challenge_length: usize,
    /// Ceremony timeout in milliseconds suggested to clients.
    pub timeout: Option<u32>,
}

impl fmt::Debug for CeremonyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CeremonyConfig")
            .field("algorithms", &self.algorithms)
            .field("attestation", &self.attestation)
            .field("extension_validators", &self.extension_validators.keys())
            .field("challenge_length", &self.challenge_length)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for CeremonyConfig {
    fn default() -> Self {
        let mut extension_validators: HashMap<String, ExtensionValidator> = HashMap::new();
        extension_validators.insert(APP_ID.to_owned(), verify_app_id);
        CeremonyConfig {
            algorithms: supported_key_algorithms(),
            attestation: AttestationRegistry::default(),
            extension_validators,
            challenge_length: DEFAULT_CHALLENGE_LENGTH,
            timeout: None,
        }
    }
}

impl CeremonyConfig {
    pub fn with_algorithms(mut self, algorithms: Vec<CoseAlgorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    pub fn with_attestation(mut self, attestation: AttestationRegistry) -> Self {
        self.attestation = attestation;
        self
    }

    pub fn with_extension_validator(mut self, identifier: impl Into<String>, validator: ExtensionValidator) -> Self {
        self.extension_validators.insert(identifier.into(), validator);
        self
    }

    pub fn with_challenge_length(mut self, challenge_length: usize) -> Self {
        self.challenge_length = challenge_length;
        self
    }

    pub fn with_timeout(mut self, timeout: u32) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.algorithms.is_empty() {
            return Err(ErrorKind::Option.detail("no credential algorithms configured"));
        }
        if self.challenge_length < MIN_CHALLENGE_LENGTH {
            return Err(ErrorKind::Option.detail(format!(
                "challenge length {} is below the minimum of {}",
                self.challenge_length, MIN_CHALLENGE_LENGTH
            )));
        }
        if self.timeout == Some(0) {
            return Err(ErrorKind::Option.detail("timeout must be positive"));
        }
        Ok(())
    }
}
