use serde::Deserialize;
use serde_bytes::ByteBuf;
use tracing::debug;

use crate::{
    authenticator_data::AuthenticatorData,
    crypto::CoseAlgorithm,
    error::{Error, ErrorKind, Result},
    types::ClientDataHash,
};

use super::certificate::AttestationCertificate;

/// [See more](https://www.w3.org/TR/webauthn/#sctn-packed-attestation)
#[derive(Debug, Deserialize)]
struct PackedAttestationStatement {
    alg: CoseAlgorithm,
    sig: ByteBuf,
    x5c: Option<Vec<ByteBuf>>,
    #[serde(rename = "ecdaaKeyId")]
    ecdaa_key_id: Option<ByteBuf>,
}

pub(super) fn signed_data(auth_data: &[u8], client_data_hash: &ClientDataHash) -> Vec<u8> {
    let mut data = Vec::with_capacity(auth_data.len() + 32);
    data.extend_from_slice(auth_data);
    data.extend_from_slice(client_data_hash.as_ref());
    data
}

/// Verifies a `packed` attestation statement, either self attestation with the
/// credential key or basic attestation with the leaf `x5c` certificate.
/// Certificate chains are not validated.
pub fn verify_packed(att_stmt: &[u8], auth_data: &[u8], client_data_hash: &ClientDataHash) -> Result<()> {
    let stmt: PackedAttestationStatement =
        ciborium::de::from_reader(att_stmt).map_err(|err| ErrorKind::VerifyAttestation.wrap(err))?;
    let decoded = AuthenticatorData::from_slice(auth_data).map_err(|err| ErrorKind::VerifyAttestation.wrap(err))?;
    let attested = decoded
        .attested_cred_data
        .ok_or_else(|| ErrorKind::VerifyAttestation.detail("missing attested credential data"))?;
    let message = signed_data(auth_data, client_data_hash);

    match (stmt.x5c, stmt.ecdaa_key_id) {
        (Some(_), Some(_)) => Err(ErrorKind::VerifyAttestation.detail("both x5c and ecdaaKeyId present")),
        (None, Some(_)) => Err(ErrorKind::VerifyAttestation.wrap(
            Error::from(ErrorKind::NotImplemented).with_detail("ECDAA attestation"),
        )),
        (Some(x5c), None) => {
            debug!("packed basic attestation");
            let leaf = x5c
                .first()
                .ok_or_else(|| ErrorKind::VerifyAttestation.detail("x5c is empty"))?;
            let cert = AttestationCertificate::from_der(leaf)?;
            if !cert.version_3 {
                return Err(ErrorKind::VerifyAttestation.detail("attestation certificate is not X.509 v3"));
            }
            if cert.is_ca {
                return Err(ErrorKind::VerifyAttestation.detail("attestation certificate is a CA"));
            }
            cert.check_aaguid(&attested.aaguid)?;
            cert.verify(stmt.alg, &message, &stmt.sig)
        }
        (None, None) => {
            debug!("packed self attestation");
            let key = attested.credential_public_key;
            if key.alg != stmt.alg {
                return Err(ErrorKind::VerifyAttestation.detail(format!(
                    "statement algorithm {:?} does not match credential algorithm {:?}",
                    stmt.alg, key.alg
                )));
            }
            key.verify(&message, &stmt.sig)
                .map_err(|err| ErrorKind::VerifyAttestation.wrap(err))
        }
    }
}
