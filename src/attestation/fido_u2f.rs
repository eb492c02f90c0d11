use serde::Deserialize;
use serde_bytes::ByteBuf;

use crate::{
    authenticator_data::{AttestedCredData, AuthenticatorData},
    crypto::{CoseAlgorithm, EllipticCurve, PublicKeyParams},
    error::{ErrorKind, Result},
    types::ClientDataHash,
};

use super::certificate::AttestationCertificate;

/// [See more](https://www.w3.org/TR/webauthn/#sctn-fido-u2f-attestation)
#[derive(Debug, Deserialize)]
struct FidoU2fAttestationStatement {
    sig: ByteBuf,
    x5c: Vec<ByteBuf>,
}

/// The message a U2F authenticator signs at registration:
/// `0x00 || rpIdHash || clientDataHash || credentialId || 0x04 || x || y`.
fn verification_data(
    rp_id_hash: &[u8; 32],
    client_data_hash: &ClientDataHash,
    attested: &AttestedCredData,
) -> Result<Vec<u8>> {
    let (x, y) = match &attested.credential_public_key.params {
        PublicKeyParams::Ec2 {
            curve: EllipticCurve::P256,
            x,
            y,
        } if x.len() == 32 && y.len() == 32 => (x, y),
        _ => {
            return Err(ErrorKind::VerifyAttestation
                .detail("fido-u2f credential key must be an uncompressed P-256 point"))
        }
    };
    let mut data = Vec::with_capacity(1 + 32 + 32 + attested.credential_id.0.len() + 65);
    data.push(0x00);
    data.extend_from_slice(rp_id_hash);
    data.extend_from_slice(client_data_hash.as_ref());
    data.extend_from_slice(&attested.credential_id.0);
    data.push(0x04);
    data.extend_from_slice(x);
    data.extend_from_slice(y);
    Ok(data)
}

/// Verifies a `fido-u2f` attestation statement against its single attestation
/// certificate.
pub fn verify_fido_u2f(att_stmt: &[u8], auth_data: &[u8], client_data_hash: &ClientDataHash) -> Result<()> {
    let stmt: FidoU2fAttestationStatement =
        ciborium::de::from_reader(att_stmt).map_err(|err| ErrorKind::VerifyAttestation.wrap(err))?;
    let cert = match stmt.x5c.as_slice() {
        [cert] => AttestationCertificate::from_der(cert)?,
        certs => {
            return Err(ErrorKind::VerifyAttestation
                .detail(format!("expected exactly one certificate, got {}", certs.len())))
        }
    };
    let decoded = AuthenticatorData::from_slice(auth_data).map_err(|err| ErrorKind::VerifyAttestation.wrap(err))?;
    let attested = decoded
        .attested_cred_data
        .as_ref()
        .ok_or_else(|| ErrorKind::VerifyAttestation.detail("missing attested credential data"))?;
    let message = verification_data(&decoded.rp_id_hash, client_data_hash, attested)?;
    cert.verify(CoseAlgorithm::ES256, &message, &stmt.sig)
}
