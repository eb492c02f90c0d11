use std::collections::BTreeMap;

use ciborium::value::Value;
use coset::iana;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    cbor,
    error::{Error, ErrorKind, Result},
};

use super::{
    ring::{verify_rsa_components, verify_with_public_key},
    CoseAlgorithm, EllipticCurve, KeyType,
};

const LABEL_KTY: i64 = iana::KeyParameter::Kty as i64;
const LABEL_ALG: i64 = iana::KeyParameter::Alg as i64;
/// Curve for EC2/OKP keys, modulus for RSA keys
const LABEL_CRV_OR_N: i64 = iana::Ec2KeyParameter::Crv as i64;
/// X coordinate for EC2/OKP keys, exponent for RSA keys
const LABEL_X_OR_E: i64 = iana::Ec2KeyParameter::X as i64;
const LABEL_Y: i64 = iana::Ec2KeyParameter::Y as i64;

/// The key-type dependent part of a [CoseKey].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyParams {
    Ec2 {
        curve: EllipticCurve,
        x: Vec<u8>,
        y: Vec<u8>,
    },
    Rsa {
        n: Vec<u8>,
        e: Vec<u8>,
    },
    Okp {
        curve: EllipticCurve,
        x: Vec<u8>,
    },
}

/// A credential public key in COSE_Key form.
///
/// The field set always matches the key type; that is checked once when
/// decoding. Whether the algorithm suits the key is checked by [CoseKey::verify].
///
/// [See more in WebAuthn spec](https://www.w3.org/TR/webauthn/#sctn-attested-credential-data)
/// [See more in COSE spec](https://datatracker.ietf.org/doc/html/rfc8152#section-7)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoseKey {
    pub alg: CoseAlgorithm,
    pub params: PublicKeyParams,
}

fn decode_error(detail: impl Into<String>) -> Error {
    ErrorKind::DecodeCoseKey.detail(detail)
}

fn take_int(fields: &mut BTreeMap<i64, Value>, label: i64, name: &str) -> Result<i64> {
    match fields.remove(&label) {
        Some(Value::Integer(i)) => {
            i64::try_from(i).map_err(|_| decode_error(format!("{} is out of range", name)))
        }
        Some(_) => Err(decode_error(format!("{} must be an integer", name))),
        None => Err(decode_error(format!("missing {}", name))),
    }
}

fn take_bytes(fields: &mut BTreeMap<i64, Value>, label: i64, name: &str) -> Result<Vec<u8>> {
    match fields.remove(&label) {
        Some(Value::Bytes(bytes)) => Ok(bytes),
        Some(_) => Err(decode_error(format!("{} must be a byte string", name))),
        None => Err(decode_error(format!("missing {}", name))),
    }
}

fn take_curve(fields: &mut BTreeMap<i64, Value>) -> Result<EllipticCurve> {
    let crv = take_int(fields, LABEL_CRV_OR_N, "crv")?;
    EllipticCurve::try_from(crv).map_err(|_| decode_error(format!("unknown curve {}", crv)))
}

fn reject_y(fields: &BTreeMap<i64, Value>, kty: KeyType) -> Result<()> {
    if fields.contains_key(&LABEL_Y) {
        return Err(decode_error(format!("{:?} key must not carry a y parameter", kty)));
    }
    Ok(())
}

impl CoseKey {
    pub fn key_type(&self) -> KeyType {
        match self.params {
            PublicKeyParams::Ec2 { .. } => KeyType::EC2,
            PublicKeyParams::Rsa { .. } => KeyType::RSA,
            PublicKeyParams::Okp { .. } => KeyType::OKP,
        }
    }

    /// Decodes a key that must occupy all of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let (value, rest) = cbor::split_item(bytes).map_err(|err| ErrorKind::DecodeCoseKey.wrap(err))?;
        if !rest.is_empty() {
            return Err(decode_error("trailing bytes after public key"));
        }
        Self::from_cbor_value(value)
    }

    pub fn from_cbor_value(value: Value) -> Result<Self> {
        let entries = match value {
            Value::Map(entries) => entries,
            _ => return Err(decode_error("public key is not a map")),
        };

        let mut fields = BTreeMap::new();
        for (label, value) in entries {
            let label = match label {
                Value::Integer(i) => {
                    i64::try_from(i).map_err(|_| decode_error("key parameter label out of range"))?
                }
                Value::Text(label) => return Err(decode_error(format!("unexpected key parameter {:?}", label))),
                _ => return Err(decode_error("invalid key parameter label")),
            };
            if fields.insert(label, value).is_some() {
                return Err(decode_error(format!("duplicate key parameter {}", label)));
            }
        }

        let kty = take_int(&mut fields, LABEL_KTY, "kty")?;
        let kty = KeyType::try_from(kty).map_err(|_| decode_error(format!("unsupported key type {}", kty)))?;
        let alg = take_int(&mut fields, LABEL_ALG, "alg")?;
        let alg = CoseAlgorithm::try_from(alg)
            .map_err(|_| decode_error(format!("unsupported algorithm {}", alg)))?;

        let params = match kty {
            KeyType::EC2 => PublicKeyParams::Ec2 {
                curve: take_curve(&mut fields)?,
                x: take_bytes(&mut fields, LABEL_X_OR_E, "x")?,
                y: take_bytes(&mut fields, LABEL_Y, "y")?,
            },
            KeyType::RSA => {
                reject_y(&fields, kty)?;
                PublicKeyParams::Rsa {
                    n: take_bytes(&mut fields, LABEL_CRV_OR_N, "n")?,
                    e: take_bytes(&mut fields, LABEL_X_OR_E, "e")?,
                }
            }
            KeyType::OKP => {
                reject_y(&fields, kty)?;
                PublicKeyParams::Okp {
                    curve: take_curve(&mut fields)?,
                    x: take_bytes(&mut fields, LABEL_X_OR_E, "x")?,
                }
            }
        };
        // a credential key carries alg and no other optional parameter, so that
        // re-encoding reproduces the authenticator's bytes
        if let Some(label) = fields.keys().next() {
            return Err(decode_error(format!("unexpected key parameter {}", label)));
        }
        Ok(CoseKey { alg, params })
    }

    pub fn to_cbor_value(&self) -> Value {
        let label = |l: i64| Value::from(l);
        let mut entries = vec![
            (label(LABEL_KTY), Value::from(i64::from(self.key_type()))),
            (label(LABEL_ALG), Value::from(i64::from(self.alg))),
        ];
        match &self.params {
            PublicKeyParams::Ec2 { curve, x, y } => {
                entries.push((label(LABEL_CRV_OR_N), Value::from(i64::from(*curve))));
                entries.push((label(LABEL_X_OR_E), Value::Bytes(x.clone())));
                entries.push((label(LABEL_Y), Value::Bytes(y.clone())));
            }
            PublicKeyParams::Rsa { n, e } => {
                entries.push((label(LABEL_CRV_OR_N), Value::Bytes(n.clone())));
                entries.push((label(LABEL_X_OR_E), Value::Bytes(e.clone())));
            }
            PublicKeyParams::Okp { curve, x } => {
                entries.push((label(LABEL_CRV_OR_N), Value::from(i64::from(*curve))));
                entries.push((label(LABEL_X_OR_E), Value::Bytes(x.clone())));
            }
        }
        Value::Map(entries)
    }

    /// Encodes the key in CTAP2 canonical form.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        cbor::to_canonical_vec(&self.to_cbor_value())
            .map_err(|err| ErrorKind::EncodeAttestedCredentialData.wrap(err))
    }

    /// The `0x04 || x || y` form of an EC2 key.
    pub(crate) fn uncompressed_point(&self) -> Option<Vec<u8>> {
        match &self.params {
            PublicKeyParams::Ec2 { x, y, .. } => {
                let mut point = Vec::with_capacity(1 + x.len() + y.len());
                point.push(0x04);
                point.extend_from_slice(x);
                point.extend_from_slice(y);
                Some(point)
            }
            _ => None,
        }
    }

    /// Verifies `signature` over `message`, dispatching on the key type and
    /// algorithm. Any pairing not listed below is rejected.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        match (&self.params, self.alg) {
            (
                PublicKeyParams::Ec2 { curve, .. },
                alg @ (CoseAlgorithm::ES256 | CoseAlgorithm::ES384 | CoseAlgorithm::ES512),
            ) => {
                let expected = match alg {
                    CoseAlgorithm::ES256 => EllipticCurve::P256,
                    CoseAlgorithm::ES384 => EllipticCurve::P384,
                    _ => EllipticCurve::P521,
                };
                if *curve != expected {
                    return Err(ErrorKind::VerifySignature.detail(format!(
                        "{:?} requires curve {:?}, key is on {:?}",
                        alg, expected, curve
                    )));
                }
                let point = self.uncompressed_point().unwrap_or_default();
                verify_with_public_key(alg, &point, message, signature)
            }
            (
                PublicKeyParams::Rsa { n, e },
                alg @ (CoseAlgorithm::PS512
                | CoseAlgorithm::PS384
                | CoseAlgorithm::PS256
                | CoseAlgorithm::RS512
                | CoseAlgorithm::RS384
                | CoseAlgorithm::RS256
                | CoseAlgorithm::RS1),
            ) => verify_rsa_components(alg, n, e, message, signature),
            (PublicKeyParams::Okp { curve, x }, CoseAlgorithm::EdDSA) => {
                if *curve != EllipticCurve::Ed25519 {
                    return Err(ErrorKind::VerifySignature
                        .detail(format!("EdDSA is only supported over Ed25519, key is on {:?}", curve)));
                }
                verify_with_public_key(CoseAlgorithm::EdDSA, x, message, signature)
            }
            (_, alg) => Err(ErrorKind::VerifySignature.detail(format!(
                "{:?} cannot be used with a {:?} key",
                alg,
                self.key_type()
            ))),
        }
    }
}

impl Serialize for CoseKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = self.to_vec().map_err(serde::ser::Error::custom)?;
        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for CoseKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = serde_bytes::ByteBuf::deserialize(deserializer)?;
        CoseKey::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}
