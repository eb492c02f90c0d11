use crate::{
    error::{ErrorKind, Result},
    types::ClientDataHash,
};

/// The canonical encoding of an empty map.
const EMPTY_MAP: [u8; 1] = [0xa0];

/// Verifies a `none` attestation statement, which must be exactly the
/// canonical empty map.
/// [See more](https://www.w3.org/TR/webauthn/#sctn-none-attestation)
pub fn verify_none(att_stmt: &[u8], _auth_data: &[u8], _client_data_hash: &ClientDataHash) -> Result<()> {
    if att_stmt != EMPTY_MAP {
        return Err(ErrorKind::VerifyAttestation.detail(format!(
            "Attestation format none with non-empty statement of {} bytes",
            att_stmt.len()
        )));
    }
    Ok(())
}
