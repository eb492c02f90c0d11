use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{
    check_auth_data,
    state::{Ceremony, CeremonyKind, CeremonyState},
    store_error, CeremonyEngine,
};
use crate::{
    attestation::AttestationObject,
    authenticator_data::AuthenticatorData,
    config::RelyingParty,
    error::{ErrorKind, Result},
    extensions::{validate_client_extension_outputs, AuthenticationExtensionsClientOutputs},
    options::{
        apply, AuthenticatorSelectionCriteria, Challenge, CreationOption, PublicKeyCredentialCreationOptions,
        PublicKeyCredentialParameters, PublicKeyCredentialRpEntity, PublicKeyType, UserVerificationRequirement,
    },
    storage::{Credential, CredentialStore},
    types::{ClientDataHash, CredentialId, User},
};

const KIND: ErrorKind = ErrorKind::VerifyRegistration;

/// What the relying party keeps between starting and finishing a registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationSession {
    pub options: PublicKeyCredentialCreationOptions,
}

/// The client's response to a registration. The caller checks the client data
/// JSON (type, challenge, origin) and passes its hash.
/// [See more](https://www.w3.org/TR/webauthn/#authenticatorattestationresponse)
#[derive(Debug, Clone)]
pub struct AttestationResponse {
    pub raw_id: CredentialId,
    pub client_data_hash: ClientDataHash,
    pub attestation_object: Vec<u8>,
    pub client_extension_results: AuthenticationExtensionsClientOutputs,
}

impl<R: RelyingParty, S: CredentialStore> CeremonyEngine<R, S> {
    /// Builds the options a client needs to create a credential for `user`.
    pub fn start_registration(&self, user: User, options: Vec<CreationOption>) -> Result<RegistrationSession> {
        let authenticator_selection = self.rp.user_verification_required().then(|| AuthenticatorSelectionCriteria {
            user_verification: UserVerificationRequirement::Required,
            ..Default::default()
        });
        let mut creation = PublicKeyCredentialCreationOptions {
            rp: PublicKeyCredentialRpEntity {
                id: self.rp.id().to_owned(),
                name: self.rp.name().to_owned(),
            },
            user,
            challenge: Challenge::generate(self.config.challenge_length)?,
            pub_key_cred_params: self
                .config
                .algorithms
                .iter()
                .map(|&alg| PublicKeyCredentialParameters {
                    _type: PublicKeyType::PublicKey,
                    alg,
                })
                .collect(),
            timeout: self.config.timeout,
            exclude_credentials: vec![],
            authenticator_selection,
            attestation: Default::default(),
            extensions: Default::default(),
        };
        apply(&mut creation, options)?;
        trace!(challenge = ?creation.challenge, "started registration");
        Ok(RegistrationSession { options: creation })
    }

    /// Verifies a registration response and stores the new credential.
    pub fn finish_registration(
        &self,
        session: &RegistrationSession,
        response: &AttestationResponse,
    ) -> Result<Credential> {
        let mut ceremony = Ceremony::start(CeremonyKind::Registration);
        let result = self.verify_registration(&mut ceremony, session, response);
        ceremony.finish(result)
    }

    fn verify_registration(
        &self,
        ceremony: &mut Ceremony,
        session: &RegistrationSession,
        response: &AttestationResponse,
    ) -> Result<Credential> {
        let options = &session.options;
        if response.raw_id.0.is_empty() {
            return Err(KIND.detail("empty credential id"));
        }
        ceremony.advance(CeremonyState::ClientDataValidated);

        let object = AttestationObject::from_slice(&response.attestation_object)?;
        let auth_data = AuthenticatorData::from_slice(&object.auth_data)?;
        ceremony.advance(CeremonyState::AuthenticatorDataDecoded);

        let uv_requested = options
            .authenticator_selection
            .as_ref()
            .map_or(false, |criteria| criteria.user_verification == UserVerificationRequirement::Required);
        check_auth_data(KIND, &auth_data, self.rp.id(), self.user_verification_required(uv_requested))?;
        let sign_count = auth_data.sign_count;
        let attested = auth_data
            .attested_cred_data
            .ok_or_else(|| KIND.detail("missing attested credential data"))?;
        if attested.credential_id != response.raw_id {
            return Err(KIND.detail("attested credential id does not match the response"));
        }
        let alg = attested.credential_public_key.alg;
        if !options.pub_key_cred_params.iter().any(|params| params.alg == alg) {
            return Err(KIND.detail(format!("credential algorithm {:?} was not offered", alg)));
        }
        let fmt = object.format()?;
        let allowed = self.rp.allowed_attestation_formats();
        if !allowed.is_empty() && !allowed.contains(&fmt) {
            return Err(KIND.detail(format!("attestation format {} is not allowed", fmt)));
        }
        self.config.attestation.verify(&object, &response.client_data_hash)?;
        let existing = self
            .store
            .find_credential(&attested.credential_id)
            .map_err(|err| store_error(KIND, err))?;
        if existing.is_some() {
            return Err(KIND.detail("credential is already registered"));
        }
        ceremony.advance(CeremonyState::CredentialTrustEstablished);

        validate_client_extension_outputs(
            &options.extensions,
            &response.client_extension_results,
            &self.config.extension_validators,
        )?;
        ceremony.advance(CeremonyState::ExtensionsValidated);

        let credential = Credential {
            id: attested.credential_id,
            owner: options.user.id.clone(),
            public_key: attested.credential_public_key,
            sign_count,
            aaguid: attested.aaguid,
            attestation_format: fmt,
        };
        let saved = self
            .store
            .save_credential(credential.clone())
            .map_err(|err| store_error(KIND, err))?;
        if !saved {
            return Err(KIND.detail("credential is already registered"));
        }
        trace!(credential_id = %hex::encode(&credential.id.0), "registered credential");
        Ok(credential)
    }
}
