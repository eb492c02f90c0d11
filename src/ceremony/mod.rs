//! The registration and authentication ceremonies.
//!
//! A ceremony is started by building options for the client, and finished by
//! verifying the client's response against them. Every check runs in a fixed
//! order and the first failure rejects the ceremony without touching storage.

mod authentication;
mod registration;
mod state;

pub use self::authentication::{AssertionResponse, AuthenticationSession};
pub use self::registration::{AttestationResponse, RegistrationSession};
pub use self::state::{CeremonyKind, CeremonyState};

use crate::{
    authenticator_data::AuthenticatorData,
    config::{CeremonyConfig, RelyingParty},
    crypto::sha256,
    error::{Error, ErrorKind, Result},
};

/// Runs ceremonies for one relying party against one credential store.
///
/// The engine holds no mutable state of its own and may be shared between
/// threads; the store serializes updates to a credential.
#[derive(Debug)]
pub struct CeremonyEngine<R, S> {
    rp: R,
    store: S,
    config: CeremonyConfig,
}

impl<R, S> CeremonyEngine<R, S> {
    pub fn new(rp: R, store: S, config: CeremonyConfig) -> Result<Self> {
        config.validate()?;
        Ok(CeremonyEngine { rp, store, config })
    }

    pub fn relying_party(&self) -> &R {
        &self.rp
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &CeremonyConfig {
        &self.config
    }
}

fn store_error(kind: ErrorKind, err: impl std::error::Error + Send + Sync + 'static) -> Error {
    kind.wrap(err).with_detail("credential store failed")
}

/// The checks on authenticator data common to both ceremonies: the RP ID hash
/// must be the digest of `rp_id`, the user must be present, and verified if
/// `require_user_verification`.
fn check_auth_data(
    kind: ErrorKind,
    auth_data: &AuthenticatorData,
    rp_id: &str,
    require_user_verification: bool,
) -> Result<()> {
    if auth_data.rp_id_hash != sha256(rp_id.as_bytes()) {
        return Err(kind.detail(format!("RP ID hash does not match {:?}", rp_id)));
    }
    if !auth_data.flags.user_present() {
        return Err(kind.detail("user not present"));
    }
    if require_user_verification && !auth_data.flags.user_verified() {
        return Err(kind.detail("user verification required"));
    }
    Ok(())
}

impl<R: RelyingParty, S> CeremonyEngine<R, S> {
    fn user_verification_required(&self, requested: bool) -> bool {
        requested || self.rp.user_verification_required()
    }
}
