//! Attestation objects and the format-indexed registry of statement verifiers.
//!
//! [See more](https://www.w3.org/TR/webauthn/#sctn-attestation)

mod certificate;
mod fido_u2f;
mod none;
mod packed;

pub use self::fido_u2f::verify_fido_u2f;
pub use self::none::verify_none;
pub use self::packed::verify_packed;

use std::{collections::BTreeMap, fmt, str::FromStr, sync::Arc};

use ciborium::value::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::{
    cbor,
    error::{Error, ErrorKind, Result},
    types::ClientDataHash,
};

/// An attestation statement format identifier.
/// [See more](https://www.iana.org/assignments/webauthn/webauthn.xhtml)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttestationStatementFormat {
    Packed,
    Tpm,
    AndroidKey,
    AndroidSafetyNet,
    FidoU2f,
    None,
}

impl AttestationStatementFormat {
    pub const ALL: [AttestationStatementFormat; 6] = [
        AttestationStatementFormat::Packed,
        AttestationStatementFormat::Tpm,
        AttestationStatementFormat::AndroidKey,
        AttestationStatementFormat::AndroidSafetyNet,
        AttestationStatementFormat::FidoU2f,
        AttestationStatementFormat::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttestationStatementFormat::Packed => "packed",
            AttestationStatementFormat::Tpm => "tpm",
            AttestationStatementFormat::AndroidKey => "android-key",
            AttestationStatementFormat::AndroidSafetyNet => "android-safetynet",
            AttestationStatementFormat::FidoU2f => "fido-u2f",
            AttestationStatementFormat::None => "none",
        }
    }

    /// Checks a format identifier received on the wire. Matching is exact:
    /// `"None"` or `""` are not formats.
    pub fn valid(fmt: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.as_str() == fmt)
            .ok_or_else(|| {
                ErrorKind::VerifyAttestation.detail(format!("Invalid attestation statement {:?}", fmt))
            })
    }
}

impl fmt::Display for AttestationStatementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttestationStatementFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::valid(s)
    }
}

impl Serialize for AttestationStatementFormat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AttestationStatementFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fmt = String::deserialize(deserializer)?;
        Self::valid(&fmt).map_err(serde::de::Error::custom)
    }
}

/// The `attestationObject` produced by an authenticator at registration.
///
/// `fmt` is kept exactly as received, so an unknown identifier only fails when
/// the statement is verified. `att_stmt` holds the statement's exact encoded
/// bytes.
///
/// [See more](https://www.w3.org/TR/webauthn/#attestation-object)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationObject {
    pub fmt: String,
    pub att_stmt: Vec<u8>,
    pub auth_data: Vec<u8>,
}

const KEY_FMT: &str = "fmt";
const KEY_ATT_STMT: &str = "attStmt";
const KEY_AUTH_DATA: &str = "authData";

fn unmarshal_error(detail: impl Into<String>) -> Error {
    ErrorKind::UnmarshalAttestationObject.detail(detail)
}

fn write_value(out: &mut Vec<u8>, value: &Value) -> Result<()> {
    ciborium::ser::into_writer(value, out).map_err(|err| ErrorKind::MarshalAttestationObject.wrap(err))
}

impl AttestationObject {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let (entries, mut rest) =
            cbor::read_map_header(bytes).map_err(|err| ErrorKind::UnmarshalAttestationObject.wrap(err))?;

        let mut fmt = None;
        let mut att_stmt = None;
        let mut auth_data = None;
        for _ in 0..entries {
            let (key, after_key) =
                cbor::split_item(rest).map_err(|err| ErrorKind::UnmarshalAttestationObject.wrap(err))?;
            let key = match key {
                Value::Text(key) => key,
                other => return Err(unmarshal_error(format!("unexpected map key {:?}", other))),
            };
            let (raw, after_value) = cbor::split_raw_item(after_key)
                .map_err(|err| ErrorKind::UnmarshalAttestationObject.wrap(err))?;
            rest = after_value;

            let slot = match key.as_str() {
                KEY_FMT => &mut fmt,
                KEY_ATT_STMT => &mut att_stmt,
                KEY_AUTH_DATA => &mut auth_data,
                _ => continue,
            };
            if slot.replace(raw).is_some() {
                return Err(unmarshal_error(format!("duplicate key {:?}", key)));
            }
        }
        if !rest.is_empty() {
            return Err(unmarshal_error(format!("{} trailing bytes", rest.len())));
        }

        let fmt = match fmt.map(cbor::split_item) {
            Some(Ok((Value::Text(fmt), _))) => fmt,
            Some(_) => return Err(unmarshal_error("fmt is not a text string")),
            None => return Err(unmarshal_error("missing fmt")),
        };
        let auth_data = match auth_data.map(cbor::split_item) {
            Some(Ok((Value::Bytes(auth_data), _))) => auth_data,
            Some(_) => return Err(unmarshal_error("authData is not a byte string")),
            None => return Err(unmarshal_error("missing authData")),
        };
        let att_stmt = att_stmt.ok_or_else(|| unmarshal_error("missing attStmt"))?;

        Ok(AttestationObject {
            fmt,
            att_stmt: att_stmt.to_vec(),
            auth_data,
        })
    }

    /// Encodes the object with its keys in canonical order. The statement bytes
    /// are written untouched.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        match cbor::split_raw_item(&self.att_stmt) {
            Ok((_, rest)) if rest.is_empty() => {}
            _ => {
                return Err(ErrorKind::MarshalAttestationObject
                    .detail("attStmt is not a single data item"))
            }
        }

        // a map of 3 entries
        let mut out = vec![0xa3];
        write_value(&mut out, &Value::Text(KEY_FMT.to_owned()))?;
        write_value(&mut out, &Value::Text(self.fmt.clone()))?;
        write_value(&mut out, &Value::Text(KEY_ATT_STMT.to_owned()))?;
        out.extend_from_slice(&self.att_stmt);
        write_value(&mut out, &Value::Text(KEY_AUTH_DATA.to_owned()))?;
        write_value(&mut out, &Value::Bytes(self.auth_data.clone()))?;
        Ok(out)
    }

    /// The statement format, if `fmt` names one.
    pub fn format(&self) -> Result<AttestationStatementFormat> {
        AttestationStatementFormat::valid(&self.fmt)
    }
}

/// Checks an attestation statement of one format.
///
/// `auth_data` is the raw authenticator data the statement signs over, together
/// with `client_data_hash`. Failures are returned already categorized, normally
/// as [ErrorKind::VerifyAttestation].
pub trait AttestationStatementVerifier: Send + Sync {
    fn verify(&self, att_stmt: &[u8], auth_data: &[u8], client_data_hash: &ClientDataHash)
        -> Result<()>;
}

impl<F> AttestationStatementVerifier for F
where
    F: Fn(&[u8], &[u8], &ClientDataHash) -> Result<()> + Send + Sync,
{
    fn verify(
        &self,
        att_stmt: &[u8],
        auth_data: &[u8],
        client_data_hash: &ClientDataHash,
    ) -> Result<()> {
        self(att_stmt, auth_data, client_data_hash)
    }
}

/// Maps each attestation statement format to its verifier.
///
/// The registry is configuration: a deployment decides which formats it
/// accepts by registering verifiers for them. The default registry accepts only
/// `none`.
#[derive(Clone)]
pub struct AttestationRegistry {
    verifiers: BTreeMap<AttestationStatementFormat, Arc<dyn AttestationStatementVerifier>>,
}

impl fmt::Debug for AttestationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.verifiers.keys()).finish()
    }
}

impl Default for AttestationRegistry {
    fn default() -> Self {
        Self::empty().with(AttestationStatementFormat::None, verify_none)
    }
}

impl AttestationRegistry {
    /// A registry that rejects every format.
    pub fn empty() -> Self {
        AttestationRegistry {
            verifiers: BTreeMap::new(),
        }
    }

    /// `none`, `packed` and `fido-u2f`.
    pub fn with_builtin_verifiers() -> Self {
        Self::default()
            .with(AttestationStatementFormat::Packed, verify_packed)
            .with(AttestationStatementFormat::FidoU2f, verify_fido_u2f)
    }

    pub fn with(
        mut self,
        fmt: AttestationStatementFormat,
        verifier: impl AttestationStatementVerifier + 'static,
    ) -> Self {
        self.register(fmt, verifier);
        self
    }

    /// Registers `verifier` for `fmt`, replacing any previous one.
    pub fn register(
        &mut self,
        fmt: AttestationStatementFormat,
        verifier: impl AttestationStatementVerifier + 'static,
    ) {
        self.verifiers.insert(fmt, Arc::new(verifier));
    }

    pub fn unregister(&mut self, fmt: AttestationStatementFormat) {
        self.verifiers.remove(&fmt);
    }

    /// The formats that currently have a verifier.
    pub fn supported_formats(&self) -> Vec<AttestationStatementFormat> {
        self.verifiers.keys().copied().collect()
    }

    pub fn verify(&self, object: &AttestationObject, client_data_hash: &ClientDataHash) -> Result<()> {
        let fmt = object.format()?;
        let verifier = self.verifiers.get(&fmt).ok_or_else(|| {
            ErrorKind::VerifyAttestation.wrap(
                Error::from(ErrorKind::NotImplemented)
                    .with_detail(format!("no verifier registered for format {}", fmt)),
            )
        })?;
        debug!(%fmt, "verifying attestation statement");
        verifier.verify(&object.att_stmt, &object.auth_data, client_data_hash)
    }
}
