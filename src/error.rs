use std::fmt;

use thiserror::Error;

/// A boxed lower-level cause attached to an [Error].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The category of a relying party failure. Callers branch on this, never on
/// the formatted message.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[error("Error decoding attested credential data")]
    DecodeAttestedCredentialData,

    #[error("Error decoding authenticator data")]
    DecodeAuthenticatorData,

    #[error("Error decoding raw public key")]
    DecodeCoseKey,

    #[error("Error encoding attested credential data")]
    EncodeAttestedCredentialData,

    #[error("Error encoding authenticator data")]
    EncodeAuthenticatorData,

    #[error("Error generating challenge")]
    GenerateChallenge,

    #[error("Error marshaling attestation object")]
    MarshalAttestationObject,

    #[error("Option error")]
    Option,

    #[error("Not implemented")]
    NotImplemented,

    #[error("Error unmarshaling attestation object")]
    UnmarshalAttestationObject,

    #[error("Error verifying attestation")]
    VerifyAttestation,

    #[error("Error verifying authentication")]
    VerifyAuthentication,

    #[error("Error verifying client extension output")]
    VerifyClientExtensionOutput,

    #[error("Error verifying registration")]
    VerifyRegistration,

    #[error("Error verifying signature")]
    VerifySignature,
}

impl ErrorKind {
    /// Creates an error of this kind wrapping a lower-level cause.
    pub fn wrap(self, cause: impl Into<BoxError>) -> Error {
        Error::from(self).wrap(cause)
    }

    /// Creates an error of this kind carrying a human-readable detail.
    pub fn detail(self, detail: impl Into<String>) -> Error {
        Error::from(self).with_detail(detail)
    }
}

#[derive(Debug, Default)]
struct Detail(Option<String>);

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(detail) => write!(f, ": {}", detail),
            None => Ok(()),
        }
    }
}

/// An error in a relying party operation: a categorical [ErrorKind], an
/// optional detail message and an optional wrapped cause.
#[derive(Debug, Error)]
#[error("{kind}{detail}")]
pub struct Error {
    kind: ErrorKind,
    detail: Detail,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.0.as_deref()
    }

    /// Attaches `cause` as the wrapped error, replacing any previous one.
    pub fn wrap(mut self, cause: impl Into<BoxError>) -> Self {
        self.source = Some(cause.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Detail(Some(detail.into()));
        self
    }

    /// Whether this error, or any [Error] in its chain of causes, is of `kind`.
    /// Matching is structural: details and wrapped causes never affect it.
    pub fn is(&self, kind: ErrorKind) -> bool {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self);
        while let Some(err) = current {
            let matched = match err.downcast_ref::<Error>() {
                Some(err) => err.kind == kind,
                None => err.downcast_ref::<ErrorKind>() == Some(&kind),
            };
            if matched {
                return true;
            }
            current = err.source();
        }
        false
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            detail: Detail::default(),
            source: None,
        }
    }
}

impl PartialEq<ErrorKind> for Error {
    fn eq(&self, other: &ErrorKind) -> bool {
        self.kind == *other
    }
}
