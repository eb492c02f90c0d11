//! Relying party side of WebAuthn: decoding authenticator data and attestation
//! objects, verifying attestation statements and assertion signatures, and
//! running the registration and authentication ceremonies against a
//! credential store.

pub mod attestation;
pub mod authenticator_data;
pub mod cbor;
pub mod ceremony;
pub mod config;
pub mod crypto;
pub mod error;
pub mod extensions;
pub mod options;
pub mod storage;
pub mod types;

#[cfg(test)]
mod test_util;

pub use crate::{
    attestation::{AttestationObject, AttestationRegistry, AttestationStatementFormat, AttestationStatementVerifier},
    authenticator_data::{AttestedCredData, AuthenticatorData, AuthenticatorDataFlags},
    ceremony::{AssertionResponse, AttestationResponse, AuthenticationSession, CeremonyEngine, RegistrationSession},
    config::{CeremonyConfig, RelyingParty, RelyingPartyConfig},
    crypto::{CoseAlgorithm, CoseKey},
    error::{Error, ErrorKind, Result},
    storage::{Credential, CredentialStore, MemoryCredentialStore},
    types::{Aaguid, ClientDataHash, CredentialId, User, UserHandle},
};
