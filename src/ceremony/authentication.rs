use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::{
    check_auth_data,
    state::{Ceremony, CeremonyKind, CeremonyState},
    store_error, CeremonyEngine,
};
use crate::{
    authenticator_data::AuthenticatorData,
    config::RelyingParty,
    error::{ErrorKind, Result},
    extensions::{effective_rp_id, validate_client_extension_outputs, AuthenticationExtensionsClientOutputs},
    options::{apply, Challenge, PublicKeyCredentialRequestOptions, RequestOption, UserVerificationRequirement},
    storage::{Credential, CredentialStore},
    types::{ClientDataHash, CredentialId, UserHandle},
};

const KIND: ErrorKind = ErrorKind::VerifyAuthentication;

/// What the relying party keeps between starting and finishing an authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationSession {
    pub options: PublicKeyCredentialRequestOptions,
}

/// The client's response to an authentication. The caller checks the client
/// data JSON (type, challenge, origin) and passes its hash.
/// [See more](https://www.w3.org/TR/webauthn/#authenticatorassertionresponse)
#[derive(Debug, Clone)]
pub struct AssertionResponse {
    pub raw_id: CredentialId,
    pub client_data_hash: ClientDataHash,
    pub authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<UserHandle>,
    pub client_extension_results: AuthenticationExtensionsClientOutputs,
}

/// A presented sign count must exceed the stored one, unless both are zero,
/// which means the authenticator does not count.
fn check_sign_count(stored: u32, presented: u32) -> Result<()> {
    if stored == 0 && presented == 0 {
        return Ok(());
    }
    if presented <= stored {
        warn!(stored, presented, "sign count did not increase, authenticator may be cloned");
        return Err(KIND.detail(format!(
            "sign count {} is not greater than stored sign count {}",
            presented, stored
        )));
    }
    Ok(())
}

impl<R: RelyingParty, S: CredentialStore> CeremonyEngine<R, S> {
    /// Builds the options a client needs to produce an assertion.
    pub fn start_authentication(&self, options: Vec<RequestOption>) -> Result<AuthenticationSession> {
        let user_verification = if self.rp.user_verification_required() {
            UserVerificationRequirement::Required
        } else {
            UserVerificationRequirement::default()
        };
        let mut request = PublicKeyCredentialRequestOptions {
            challenge: Challenge::generate(self.config.challenge_length)?,
            timeout: self.config.timeout,
            rp_id: self.rp.id().to_owned(),
            allow_credentials: vec![],
            user_verification,
            extensions: Default::default(),
        };
        apply(&mut request, options)?;
        trace!(challenge = ?request.challenge, "started authentication");
        Ok(AuthenticationSession { options: request })
    }

    /// Verifies an assertion and advances the credential's stored sign count.
    /// Returns the credential as it is stored afterwards.
    pub fn finish_authentication(
        &self,
        session: &AuthenticationSession,
        response: &AssertionResponse,
    ) -> Result<Credential> {
        let mut ceremony = Ceremony::start(CeremonyKind::Authentication);
        let result = self.verify_authentication(&mut ceremony, session, response);
        ceremony.finish(result)
    }

    fn verify_authentication(
        &self,
        ceremony: &mut Ceremony,
        session: &AuthenticationSession,
        response: &AssertionResponse,
    ) -> Result<Credential> {
        let options = &session.options;
        if !options.allow_credentials.is_empty()
            && !options.allow_credentials.iter().any(|descriptor| descriptor.id == response.raw_id)
        {
            return Err(KIND.detail("credential is not in the allow list"));
        }
        let credential = self
            .store
            .find_credential(&response.raw_id)
            .map_err(|err| store_error(KIND, err))?
            .ok_or_else(|| KIND.detail(format!("unknown credential {:?}", response.raw_id)))?;
        if let Some(user_handle) = &response.user_handle {
            if *user_handle != credential.owner {
                return Err(KIND.detail("user handle does not own the credential"));
            }
        }
        ceremony.advance(CeremonyState::ClientDataValidated);

        let auth_data = AuthenticatorData::from_slice(&response.authenticator_data)?;
        ceremony.advance(CeremonyState::AuthenticatorDataDecoded);

        let rp_id = effective_rp_id(&self.rp, &options.extensions, &response.client_extension_results);
        let uv_requested = options.user_verification == UserVerificationRequirement::Required;
        check_auth_data(KIND, &auth_data, rp_id, self.user_verification_required(uv_requested))?;
        check_sign_count(credential.sign_count, auth_data.sign_count)?;
        let mut signed = Vec::with_capacity(response.authenticator_data.len() + 32);
        signed.extend_from_slice(&response.authenticator_data);
        signed.extend_from_slice(response.client_data_hash.as_ref());
        credential.public_key.verify(&signed, &response.signature)?;
        ceremony.advance(CeremonyState::CredentialTrustEstablished);

        validate_client_extension_outputs(
            &options.extensions,
            &response.client_extension_results,
            &self.config.extension_validators,
        )?;
        ceremony.advance(CeremonyState::ExtensionsValidated);

        let updated = self
            .store
            .update_sign_count(&credential.id, credential.sign_count, auth_data.sign_count)
            .map_err(|err| store_error(KIND, err))?;
        if !updated {
            return Err(KIND.detail("sign count changed during the ceremony"));
        }
        trace!(credential_id = %hex::encode(&credential.id.0), sign_count = auth_data.sign_count, "authenticated");
        Ok(Credential {
            sign_count: auth_data.sign_count,
            ..credential
        })
    }
}
