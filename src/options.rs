//! Options a relying party sends to the client to start a ceremony, and the
//! mutators used to customize them.

use std::{collections::HashSet, fmt};

use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::{
    config::MIN_CHALLENGE_LENGTH,
    crypto::CoseAlgorithm,
    error::{ErrorKind, Result},
    extensions::{build_extensions, AuthenticationExtensionsClientInputs, Extension},
    types::{CredentialId, User},
};

/// A random value the authenticator signs over, binding a response to one
/// ceremony.
/// [See more](https://www.w3.org/TR/webauthn/#sctn-cryptographic-challenges)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge(#[serde(with = "serde_bytes")] pub Vec<u8>);

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Challenge({})", hex::encode(&self.0))
    }
}

impl Challenge {
    pub fn generate(length: usize) -> Result<Self> {
        if length < MIN_CHALLENGE_LENGTH {
            return Err(ErrorKind::GenerateChallenge.detail(format!(
                "challenge of {} bytes is shorter than {}",
                length, MIN_CHALLENGE_LENGTH
            )));
        }
        let mut bytes = vec![0u8; length];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| ErrorKind::GenerateChallenge.detail("system random source failed"))?;
        Ok(Challenge(bytes))
    }
}

/// Currently there's only 1 credential type (public key)
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublicKeyType {
    #[default]
    #[serde(rename = "public-key")]
    PublicKey,
}

/// [See more](https://w3c.github.io/webauthn/#dictdef-publickeycredentialrpentity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialRpEntity {
    pub id: String,
    pub name: String,
}

/// [See more](https://w3c.github.io/webauthn/#dictdef-publickeycredentialparameters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialParameters {
    #[serde(rename = "type")]
    pub _type: PublicKeyType,
    pub alg: CoseAlgorithm,
}

/// [See more](https://w3c.github.io/webauthn/#dictdef-publickeycredentialdescriptor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialDescriptor {
    #[serde(rename = "type")]
    pub _type: PublicKeyType,
    pub id: CredentialId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

impl PublicKeyCredentialDescriptor {
    pub fn new(id: CredentialId) -> Self {
        PublicKeyCredentialDescriptor {
            _type: PublicKeyType::PublicKey,
            id,
            transports: vec![],
        }
    }
}

/// [See more](https://w3c.github.io/webauthn/#enum-userVerificationRequirement)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationRequirement {
    Required,
    #[default]
    Preferred,
    Discouraged,
}

/// [See more](https://w3c.github.io/webauthn/#enum-attestation-convey)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    #[default]
    None,
    Indirect,
    Direct,
    Enterprise,
}

/// [See more](https://w3c.github.io/webauthn/#dictdef-authenticatorselectioncriteria)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    #[serde(default)]
    pub require_resident_key: bool,
    #[serde(default)]
    pub user_verification: UserVerificationRequirement,
}

/// [See more](https://w3c.github.io/webauthn/#dictdef-publickeycredentialcreationoptions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialCreationOptions {
    pub rp: PublicKeyCredentialRpEntity,
    pub user: User,
    pub challenge: Challenge,
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_credentials: Vec<PublicKeyCredentialDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,
    #[serde(default)]
    pub attestation: AttestationConveyancePreference,
    #[serde(default, skip_serializing_if = "AuthenticationExtensionsClientInputs::is_empty")]
    pub extensions: AuthenticationExtensionsClientInputs,
}

/// [See more](https://w3c.github.io/webauthn/#dictdef-publickeycredentialrequestoptions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    pub challenge: Challenge,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    pub rp_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_credentials: Vec<PublicKeyCredentialDescriptor>,
    #[serde(default)]
    pub user_verification: UserVerificationRequirement,
    #[serde(default, skip_serializing_if = "AuthenticationExtensionsClientInputs::is_empty")]
    pub extensions: AuthenticationExtensionsClientInputs,
}

/// Fields shared by creation and request options.
pub trait CeremonyOptions {
    fn timeout_mut(&mut self) -> &mut Option<u32>;
    fn extensions_mut(&mut self) -> &mut AuthenticationExtensionsClientInputs;
}

impl CeremonyOptions for PublicKeyCredentialCreationOptions {
    fn timeout_mut(&mut self) -> &mut Option<u32> {
        &mut self.timeout
    }

    fn extensions_mut(&mut self) -> &mut AuthenticationExtensionsClientInputs {
        &mut self.extensions
    }
}

impl CeremonyOptions for PublicKeyCredentialRequestOptions {
    fn timeout_mut(&mut self) -> &mut Option<u32> {
        &mut self.timeout
    }

    fn extensions_mut(&mut self) -> &mut AuthenticationExtensionsClientInputs {
        &mut self.extensions
    }
}

/// Customizes a set of ceremony options. Fails with [ErrorKind::Option].
pub type OptionFn<O> = Box<dyn FnOnce(&mut O) -> Result<()> + Send>;

pub type CreationOption = OptionFn<PublicKeyCredentialCreationOptions>;
pub type RequestOption = OptionFn<PublicKeyCredentialRequestOptions>;

/// Applies `options` in order, stopping at the first failure.
pub(crate) fn apply<O>(target: &mut O, options: impl IntoIterator<Item = OptionFn<O>>) -> Result<()> {
    for option in options {
        option(target)?;
    }
    Ok(())
}

fn check_descriptors(descriptors: &[PublicKeyCredentialDescriptor]) -> Result<()> {
    let mut seen = HashSet::new();
    for descriptor in descriptors {
        if !seen.insert(&descriptor.id) {
            return Err(ErrorKind::Option.detail(format!("duplicate credential {:?}", descriptor.id)));
        }
    }
    Ok(())
}

/// Sets the ceremony timeout in milliseconds.
pub fn timeout<O: CeremonyOptions + 'static>(timeout: u32) -> OptionFn<O> {
    Box::new(move |options: &mut O| {
        if timeout == 0 {
            return Err(ErrorKind::Option.detail("timeout must be positive"));
        }
        *options.timeout_mut() = Some(timeout);
        Ok(())
    })
}

/// Adds client extension inputs, replacing inputs with the same identifier.
pub fn extensions<O: CeremonyOptions + 'static>(extensions: Vec<Extension>) -> OptionFn<O> {
    Box::new(move |options: &mut O| {
        options.extensions_mut().extend(build_extensions(extensions));
        Ok(())
    })
}

pub fn exclude_credentials(descriptors: Vec<PublicKeyCredentialDescriptor>) -> CreationOption {
    Box::new(move |options: &mut PublicKeyCredentialCreationOptions| {
        check_descriptors(&descriptors)?;
        options.exclude_credentials = descriptors;
        Ok(())
    })
}

pub fn attestation(preference: AttestationConveyancePreference) -> CreationOption {
    Box::new(move |options: &mut PublicKeyCredentialCreationOptions| {
        options.attestation = preference;
        Ok(())
    })
}

pub fn authenticator_selection(criteria: AuthenticatorSelectionCriteria) -> CreationOption {
    Box::new(move |options: &mut PublicKeyCredentialCreationOptions| {
        options.authenticator_selection = Some(criteria);
        Ok(())
    })
}

pub fn allow_credentials(descriptors: Vec<PublicKeyCredentialDescriptor>) -> RequestOption {
    Box::new(move |options: &mut PublicKeyCredentialRequestOptions| {
        check_descriptors(&descriptors)?;
        options.allow_credentials = descriptors;
        Ok(())
    })
}

pub fn user_verification(requirement: UserVerificationRequirement) -> RequestOption {
    Box::new(move |options: &mut PublicKeyCredentialRequestOptions| {
        options.user_verification = requirement;
        Ok(())
    })
}
