use ciborium::value::Value;
use modular_bitfield::{bitfield, prelude::B3};
use tracing::trace;
use zerocopy::{AsBytes, BigEndian, FromBytes, LayoutVerified, Unaligned, U16, U32};

use crate::{
    cbor,
    crypto::CoseKey,
    error::{ErrorKind, Result},
    types::{Aaguid, CredentialId},
};

#[bitfield]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// [See more](https://www.w3.org/TR/webauthn/#authenticator-data)
pub struct AuthenticatorDataFlags {
    pub user_present: bool,
    pub rfu_1: bool,
    pub user_verified: bool,
    pub rfu_2: B3,
    pub attested_data_included: bool,
    pub extension_data_included: bool,
}

/// [See more](https://www.w3.org/TR/webauthn/#attested-credential-data)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredData {
    pub aaguid: Aaguid,
    pub credential_id: CredentialId,
    pub credential_public_key: CoseKey,
}

/// Authenticator extension outputs, as the entries of a CBOR map.
pub type AuthenticatorExtensions = Vec<(Value, Value)>;

/// `attested_cred_data` is present exactly when the AT flag is set, and
/// `extensions` exactly when the ED flag is set.
///
/// [See more](https://www.w3.org/TR/webauthn/#authenticator-data)
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: AuthenticatorDataFlags,
    /// 0 when the authenticator does not implement a signature counter
    pub sign_count: u32,
    pub attested_cred_data: Option<AttestedCredData>,
    pub extensions: Option<AuthenticatorExtensions>,
}

#[derive(FromBytes, AsBytes, Unaligned)]
#[repr(C)]
struct Header {
    rp_id_hash: [u8; 32],
    flags: u8,
    sign_count: U32<BigEndian>,
}

#[derive(FromBytes, AsBytes, Unaligned)]
#[repr(C)]
struct AttestedHeader {
    aaguid: [u8; 16],
    credential_id_length: U16<BigEndian>,
}

/// Length of the fixed part of the record.
pub const AUTH_DATA_HEADER_LEN: usize = 37;

impl AttestedCredData {
    /// Decodes attested credential data from the front of `bytes`, returning
    /// the unconsumed remainder.
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (header, rest) = LayoutVerified::<_, AttestedHeader>::new_unaligned_from_prefix(bytes)
            .ok_or_else(|| {
                ErrorKind::DecodeAttestedCredentialData
                    .detail(format!("{} bytes is too short for AAGUID and length", bytes.len()))
            })?;
        let id_len = header.credential_id_length.get() as usize;
        if rest.len() < id_len {
            return Err(ErrorKind::DecodeAttestedCredentialData.detail(format!(
                "credential id length is {} but only {} bytes remain",
                id_len,
                rest.len()
            )));
        }
        let (credential_id, rest) = rest.split_at(id_len);
        let (key, rest) =
            cbor::split_item(rest).map_err(|err| ErrorKind::DecodeAttestedCredentialData.wrap(err))?;
        let credential_public_key = CoseKey::from_cbor_value(key)
            .map_err(|err| ErrorKind::DecodeAttestedCredentialData.wrap(err))?;
        Ok((
            AttestedCredData {
                aaguid: Aaguid(header.aaguid),
                credential_id: CredentialId(credential_id.to_vec()),
                credential_public_key,
            },
            rest,
        ))
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let credential_id_length = u16::try_from(self.credential_id.0.len()).map_err(|_| {
            ErrorKind::EncodeAttestedCredentialData.detail(format!(
                "credential id of {} bytes does not fit a 16 bit length",
                self.credential_id.0.len()
            ))
        })?;
        let header = AttestedHeader {
            aaguid: self.aaguid.0,
            credential_id_length: U16::new(credential_id_length),
        };
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.credential_id.0);
        out.extend_from_slice(&self.credential_public_key.to_vec()?);
        Ok(())
    }
}

impl AuthenticatorData {
    /// Parses the binary authenticator data record.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let (header, mut rest) = LayoutVerified::<_, Header>::new_unaligned_from_prefix(bytes)
            .ok_or_else(|| {
                ErrorKind::DecodeAuthenticatorData.detail(format!(
                    "expected at least {} bytes, got {}",
                    AUTH_DATA_HEADER_LEN,
                    bytes.len()
                ))
            })?;
        let flags = AuthenticatorDataFlags::from_bytes([header.flags]);
        trace!(?flags, sign_count = header.sign_count.get(), "decoding authenticator data");

        let attested_cred_data = if flags.attested_data_included() {
            let (data, remainder) = AttestedCredData::decode(rest)?;
            rest = remainder;
            Some(data)
        } else {
            None
        };

        let extensions = if flags.extension_data_included() {
            let (value, remainder) =
                cbor::split_item(rest).map_err(|err| ErrorKind::DecodeAuthenticatorData.wrap(err))?;
            if !remainder.is_empty() {
                return Err(ErrorKind::DecodeAuthenticatorData
                    .detail(format!("{} trailing bytes after extensions", remainder.len())));
            }
            match value {
                Value::Map(entries) => Some(entries),
                _ => {
                    return Err(ErrorKind::DecodeAuthenticatorData.detail("extensions are not a map"))
                }
            }
        } else {
            if !rest.is_empty() {
                let kind = if flags.attested_data_included() {
                    ErrorKind::DecodeAttestedCredentialData
                } else {
                    ErrorKind::DecodeAuthenticatorData
                };
                return Err(kind.detail(format!("{} trailing bytes", rest.len())));
            }
            None
        };

        Ok(AuthenticatorData {
            rp_id_hash: header.rp_id_hash,
            flags,
            sign_count: header.sign_count.get(),
            attested_cred_data,
            extensions,
        })
    }

    /// Encodes the record. The embedded key and extensions are always written
    /// in canonical order, so re-encoding decoded data reproduces the bytes a
    /// canonical authenticator signed. Keys with parameters beyond the ones
    /// [CoseKey] models are rejected when decoding.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        if self.flags.attested_data_included() != self.attested_cred_data.is_some() {
            return Err(ErrorKind::EncodeAuthenticatorData
                .detail("AT flag does not match presence of attested credential data"));
        }
        if self.flags.extension_data_included() != self.extensions.is_some() {
            return Err(ErrorKind::EncodeAuthenticatorData
                .detail("ED flag does not match presence of extensions"));
        }

        let header = Header {
            rp_id_hash: self.rp_id_hash,
            flags: self.flags.into_bytes()[0],
            sign_count: U32::new(self.sign_count),
        };
        let mut out = header.as_bytes().to_vec();
        if let Some(attested_cred_data) = &self.attested_cred_data {
            attested_cred_data.encode(&mut out)?;
        }
        if let Some(extensions) = &self.extensions {
            let encoded = cbor::to_canonical_vec(&Value::Map(extensions.clone()))
                .map_err(|err| ErrorKind::EncodeAuthenticatorData.wrap(err))?;
            out.extend_from_slice(&encoded);
        }
        Ok(out)
    }
}
