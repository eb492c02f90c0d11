//! Typed COSE public keys and algorithm-aware signature verification.

mod cose;
mod ring;

pub use self::cose::{CoseKey, PublicKeyParams};
pub(crate) use self::ring::{sha256, verify_with_public_key};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifies a cryptographic algorithm.
///
/// [See more](https://w3c.github.io/webauthn/#typedefdef-cosealgorithmidentifier)
#[repr(i64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum CoseAlgorithm {
    /// EdDSA over Ed25519
    EdDSA = -8,
    /// ECDSA w/ SHA-512 over P-521
    ES512 = -36,
    /// ECDSA w/ SHA-384 over P-384
    ES384 = -35,
    /// ECDSA w/ SHA-256 over P-256
    ES256 = -7,
    /// RSASSA-PSS w/ SHA-512
    PS512 = -39,
    /// RSASSA-PSS w/ SHA-384
    PS384 = -38,
    /// RSASSA-PSS w/ SHA-256
    PS256 = -37,
    /// RSASSA-PKCS1-v1_5 w/ SHA-512
    RS512 = -259,
    /// RSASSA-PKCS1-v1_5 w/ SHA-384
    RS384 = -258,
    /// RSASSA-PKCS1-v1_5 w/ SHA-256
    RS256 = -257,
    /// RSASSA-PKCS1-v1_5 w/ SHA-1, only for legacy authenticators
    RS1 = -65535,
}

impl Serialize for CoseAlgorithm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64((*self).into())
    }
}

impl<'de> Deserialize<'de> for CoseAlgorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = i64::deserialize(deserializer)?;
        CoseAlgorithm::try_from(id)
            .map_err(|_| serde::de::Error::custom(format!("unsupported COSE algorithm {}", id)))
    }
}

/// COSE key types usable for WebAuthn credentials.
/// [See more](https://www.iana.org/assignments/cose/cose.xhtml#key-type)
#[repr(i64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum KeyType {
    OKP = 1,
    EC2 = 2,
    RSA = 3,
}

/// COSE elliptic curve identifiers.
#[repr(i64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum EllipticCurve {
    P256 = 1,
    P384 = 2,
    P521 = 3,
    X25519 = 4,
    X448 = 5,
    Ed25519 = 6,
    Ed448 = 7,
}

/// Supported algorithms, most preferred first.
const SUPPORTED_KEY_ALGORITHMS: [CoseAlgorithm; 11] = [
    CoseAlgorithm::EdDSA,
    CoseAlgorithm::ES512,
    CoseAlgorithm::ES384,
    CoseAlgorithm::ES256,
    CoseAlgorithm::PS512,
    CoseAlgorithm::PS384,
    CoseAlgorithm::PS256,
    CoseAlgorithm::RS512,
    CoseAlgorithm::RS384,
    CoseAlgorithm::RS256,
    CoseAlgorithm::RS1,
];

/// The algorithms this crate can verify, in the order they should be offered
/// to authenticators when creating a credential.
pub fn supported_key_algorithms() -> Vec<CoseAlgorithm> {
    SUPPORTED_KEY_ALGORITHMS.to_vec()
}
