use p521::ecdsa::{
    signature::Verifier, Signature as P521Signature, VerifyingKey as P521VerifyingKey,
};
use ring::{
    digest,
    signature::{self, RsaParameters, RsaPublicKeyComponents, UnparsedPublicKey, VerificationAlgorithm},
};

use crate::error::{ErrorKind, Result};

use super::CoseAlgorithm;

pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = digest::digest(&digest::SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}

/// PKCS#1 keys from 1024 bits are accepted for SHA-1, SHA-256 and SHA-512.
/// ring has no 1024-bit parameters for RS384 or PSS, so those need 2048 bits.
fn rsa_parameters(alg: CoseAlgorithm) -> Result<&'static RsaParameters> {
    Ok(match alg {
        CoseAlgorithm::PS512 => &signature::RSA_PSS_2048_8192_SHA512,
        CoseAlgorithm::PS384 => &signature::RSA_PSS_2048_8192_SHA384,
        CoseAlgorithm::PS256 => &signature::RSA_PSS_2048_8192_SHA256,
        CoseAlgorithm::RS512 => &signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY,
        CoseAlgorithm::RS384 => &signature::RSA_PKCS1_2048_8192_SHA384,
        CoseAlgorithm::RS256 => &signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
        CoseAlgorithm::RS1 => &signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY,
        CoseAlgorithm::EdDSA
        | CoseAlgorithm::ES512
        | CoseAlgorithm::ES384
        | CoseAlgorithm::ES256 => {
            return Err(ErrorKind::VerifySignature.detail(format!("{:?} is not an RSA algorithm", alg)))
        }
    })
}

/// Verifies `signature` over `message` given a public key in the encoding used
/// by X.509 subject public key info: an uncompressed SEC1 point for ECDSA, the
/// raw 32 byte key for Ed25519 and a DER `RSAPublicKey` for RSA.
pub(crate) fn verify_with_public_key(
    alg: CoseAlgorithm,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<()> {
    let algorithm: &'static dyn VerificationAlgorithm = match alg {
        CoseAlgorithm::ES256 => &signature::ECDSA_P256_SHA256_ASN1,
        CoseAlgorithm::ES384 => &signature::ECDSA_P384_SHA384_ASN1,
        CoseAlgorithm::ES512 => return verify_p521(public_key, message, signature),
        CoseAlgorithm::EdDSA => &signature::ED25519,
        CoseAlgorithm::PS512
        | CoseAlgorithm::PS384
        | CoseAlgorithm::PS256
        | CoseAlgorithm::RS512
        | CoseAlgorithm::RS384
        | CoseAlgorithm::RS256
        | CoseAlgorithm::RS1 => rsa_parameters(alg)?,
    };
    UnparsedPublicKey::new(algorithm, public_key)
        .verify(message, signature)
        .map_err(|_| ErrorKind::VerifySignature.detail(format!("{:?} signature is invalid", alg)))
}

/// Verifies an RSA signature given the key's big-endian modulus and exponent.
pub(crate) fn verify_rsa_components(
    alg: CoseAlgorithm,
    n: &[u8],
    e: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<()> {
    let params = rsa_parameters(alg)?;
    RsaPublicKeyComponents { n, e }
        .verify(params, message, signature)
        .map_err(|_| ErrorKind::VerifySignature.detail(format!("{:?} signature is invalid", alg)))
}

// ring has no P-521 support
fn verify_p521(point: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    let key = P521VerifyingKey::from_sec1_bytes(point)
        .map_err(|_| ErrorKind::VerifySignature.detail("invalid P-521 public key"))?;
    let signature = P521Signature::from_der(signature)
        .map_err(|_| ErrorKind::VerifySignature.detail("malformed ES512 signature"))?;
    key.verify(message, &signature)
        .map_err(|_| ErrorKind::VerifySignature.detail("ES512 signature is invalid"))
}
