//! Client extension inputs and outputs, and the AppID extension.
//!
//! [See more](https://www.w3.org/TR/webauthn/#sctn-extensions)

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use serde::{
    de::{self, MapAccess, SeqAccess, Unexpected, Visitor},
    Deserialize, Deserializer, Serialize,
};
use serde_bytes::ByteBuf;
use tracing::trace;

use crate::{
    config::RelyingParty,
    error::{ErrorKind, Result},
};

/// Extension identifier of the FIDO AppID extension.
/// [See more](https://www.w3.org/TR/webauthn/#sctn-appid-extension)
pub const APP_ID: &str = "appid";

/// A client extension input or output value.
///
/// Decoding keeps the encoded data type: byte strings stay [ExtensionValue::Bytes]
/// even when they hold valid UTF-8, and integers outside `i64` are rejected
/// rather than widened to floats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtensionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ExtensionValue>),
    Bytes(ByteBuf),
    Map(BTreeMap<String, ExtensionValue>),
}

impl<'de> Deserialize<'de> for ExtensionValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ExtensionValueVisitor)
    }
}

struct ExtensionValueVisitor;

impl<'de> Visitor<'de> for ExtensionValueVisitor {
    type Value = ExtensionValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an extension value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Self::Value, E> {
        Ok(ExtensionValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok(ExtensionValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        i64::try_from(v)
            .map(ExtensionValue::Int)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &"an integer in i64 range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
        Ok(ExtensionValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        Ok(ExtensionValue::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
        Ok(ExtensionValue::Text(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Self::Value, E> {
        Ok(ExtensionValue::Bytes(ByteBuf::from(v)))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> std::result::Result<Self::Value, E> {
        Ok(ExtensionValue::Bytes(ByteBuf::from(v)))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(64));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(ExtensionValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, ExtensionValue>()? {
            entries.insert(key, value);
        }
        Ok(ExtensionValue::Map(entries))
    }
}

impl From<bool> for ExtensionValue {
    fn from(value: bool) -> Self {
        ExtensionValue::Bool(value)
    }
}

impl From<i64> for ExtensionValue {
    fn from(value: i64) -> Self {
        ExtensionValue::Int(value)
    }
}

impl From<&str> for ExtensionValue {
    fn from(value: &str) -> Self {
        ExtensionValue::Text(value.to_owned())
    }
}

impl From<String> for ExtensionValue {
    fn from(value: String) -> Self {
        ExtensionValue::Text(value)
    }
}

/// [See more](https://www.w3.org/TR/webauthn/#dictdef-authenticationextensionsclientinputs)
pub type AuthenticationExtensionsClientInputs = BTreeMap<String, ExtensionValue>;

/// [See more](https://www.w3.org/TR/webauthn/#dictdef-authenticationextensionsclientoutputs)
pub type AuthenticationExtensionsClientOutputs = BTreeMap<String, ExtensionValue>;

/// Adds or replaces entries of a set of client extension inputs.
pub type Extension = Box<dyn FnOnce(&mut AuthenticationExtensionsClientInputs) + Send>;

/// Checks the client output of one extension against the input that requested it.
pub type ExtensionValidator = fn(input: Option<&ExtensionValue>, output: Option<&ExtensionValue>) -> Result<()>;

/// Applies `extensions` in order to an empty set of inputs. A later extension
/// overwrites an earlier one using the same identifier.
pub fn build_extensions(extensions: impl IntoIterator<Item = Extension>) -> AuthenticationExtensionsClientInputs {
    let mut inputs = AuthenticationExtensionsClientInputs::new();
    for extension in extensions {
        extension(&mut inputs);
    }
    inputs
}

/// Sets an arbitrary extension input.
pub fn use_extension(identifier: impl Into<String>, value: impl Into<ExtensionValue>) -> Extension {
    let identifier = identifier.into();
    let value = value.into();
    Box::new(move |inputs: &mut AuthenticationExtensionsClientInputs| {
        inputs.insert(identifier, value);
    })
}

/// Requests the AppID extension, so credentials registered through the FIDO
/// U2F API under `app_id` can still be used.
pub fn use_app_id(app_id: impl Into<String>) -> Extension {
    let app_id: String = app_id.into();
    use_extension(APP_ID, app_id)
}

/// The AppID output must be a boolean.
pub fn verify_app_id(_input: Option<&ExtensionValue>, output: Option<&ExtensionValue>) -> Result<()> {
    match output {
        Some(ExtensionValue::Bool(_)) => Ok(()),
        Some(other) => Err(ErrorKind::VerifyClientExtensionOutput
            .detail(format!("appid output must be a boolean, got {:?}", other))),
        None => Err(ErrorKind::VerifyClientExtensionOutput.detail("missing appid output")),
    }
}

/// The relying party identifier a ceremony's RP ID hash must match.
///
/// This is the AppID requested in `inputs` when the client reports it used
/// that AppID, and the relying party's own identifier otherwise.
pub fn effective_rp_id<'a>(
    rp: &'a dyn RelyingParty,
    inputs: &'a AuthenticationExtensionsClientInputs,
    outputs: &AuthenticationExtensionsClientOutputs,
) -> &'a str {
    match (inputs.get(APP_ID), outputs.get(APP_ID)) {
        (Some(ExtensionValue::Text(app_id)), Some(ExtensionValue::Bool(true))) => {
            trace!(%app_id, "using AppID as effective RP ID");
            app_id.as_str()
        }
        _ => rp.id(),
    }
}

/// Every output must answer a requested input, and must pass the validator
/// registered for its identifier, if any.
pub fn validate_client_extension_outputs(
    inputs: &AuthenticationExtensionsClientInputs,
    outputs: &AuthenticationExtensionsClientOutputs,
    validators: &HashMap<String, ExtensionValidator>,
) -> Result<()> {
    for (identifier, output) in outputs {
        let input = inputs.get(identifier).ok_or_else(|| {
            ErrorKind::VerifyClientExtensionOutput
                .detail(format!("output for extension {:?} that was not requested", identifier))
        })?;
        if let Some(validator) = validators.get(identifier) {
            validator(Some(input), Some(output))?;
        }
    }
    Ok(())
}
