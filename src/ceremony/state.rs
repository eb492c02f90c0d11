use tracing::{debug, trace, warn};

use crate::error::{ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyKind {
    Registration,
    Authentication,
}

impl CeremonyKind {
    /// The category every failure of this ceremony is reported under.
    pub fn error_kind(self) -> ErrorKind {
        match self {
            CeremonyKind::Registration => ErrorKind::VerifyRegistration,
            CeremonyKind::Authentication => ErrorKind::VerifyAuthentication,
        }
    }
}

/// The steps of a ceremony, in the order they are passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyState {
    ReceivedResponse,
    ClientDataValidated,
    AuthenticatorDataDecoded,
    CredentialTrustEstablished,
    ExtensionsValidated,
    Accepted,
    Rejected(ErrorKind),
}

impl CeremonyState {
    fn next(self) -> Option<CeremonyState> {
        match self {
            CeremonyState::ReceivedResponse => Some(CeremonyState::ClientDataValidated),
            CeremonyState::ClientDataValidated => Some(CeremonyState::AuthenticatorDataDecoded),
            CeremonyState::AuthenticatorDataDecoded => Some(CeremonyState::CredentialTrustEstablished),
            CeremonyState::CredentialTrustEstablished => Some(CeremonyState::ExtensionsValidated),
            CeremonyState::ExtensionsValidated => Some(CeremonyState::Accepted),
            CeremonyState::Accepted | CeremonyState::Rejected(_) => None,
        }
    }
}

/// Tracks one run of a ceremony. Steps may only be taken in order, and the
/// first failure is final.
#[derive(Debug)]
pub(crate) struct Ceremony {
    kind: CeremonyKind,
    state: CeremonyState,
}

impl Ceremony {
    pub fn start(kind: CeremonyKind) -> Self {
        trace!(ceremony = ?kind, "received response");
        Ceremony {
            kind,
            state: CeremonyState::ReceivedResponse,
        }
    }

    pub fn advance(&mut self, next: CeremonyState) {
        debug_assert_eq!(self.state.next(), Some(next), "out of order ceremony step");
        trace!(ceremony = ?self.kind, from = ?self.state, to = ?next, "ceremony step");
        self.state = next;
    }

    /// Ends the ceremony. A failure is reported under the ceremony's category,
    /// wrapping the failing step's error.
    pub fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.advance(CeremonyState::Accepted);
                debug!(ceremony = ?self.kind, "ceremony accepted");
                Ok(value)
            }
            Err(err) => {
                let top = self.kind.error_kind();
                let err = if err.kind() == top { err } else { top.wrap(err) };
                warn!(ceremony = ?self.kind, state = ?self.state, kind = ?err.kind(), %err, "ceremony rejected");
                self.state = CeremonyState::Rejected(top);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_all_steps(ceremony: &mut Ceremony) {
        ceremony.advance(CeremonyState::ClientDataValidated);
        ceremony.advance(CeremonyState::AuthenticatorDataDecoded);
        ceremony.advance(CeremonyState::CredentialTrustEstablished);
        ceremony.advance(CeremonyState::ExtensionsValidated);
    }

    #[test]
    fn test_accept() {
        let mut ceremony = Ceremony::start(CeremonyKind::Registration);
        run_all_steps(&mut ceremony);
        assert_eq!(ceremony.finish(Ok(7)).unwrap(), 7);
        assert_eq!(ceremony.state, CeremonyState::Accepted);
    }

    #[test]
    fn test_reject_wraps_cause() {
        let mut ceremony = Ceremony::start(CeremonyKind::Authentication);
        ceremony.advance(CeremonyState::ClientDataValidated);
        let err = ceremony
            .finish::<()>(Err(ErrorKind::DecodeAuthenticatorData.detail("short")))
            .unwrap_err();
        assert_eq!(err, ErrorKind::VerifyAuthentication);
        assert!(err.is(ErrorKind::DecodeAuthenticatorData));
        assert_eq!(ceremony.state, CeremonyState::Rejected(ErrorKind::VerifyAuthentication));
    }

    #[test]
    fn test_reject_keeps_top_level_error() {
        let mut ceremony = Ceremony::start(CeremonyKind::Registration);
        let err = ceremony
            .finish::<()>(Err(ErrorKind::VerifyRegistration.detail("user not present")))
            .unwrap_err();
        assert_eq!(err.detail(), Some("user not present"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    #[should_panic(expected = "out of order ceremony step")]
    #[cfg(debug_assertions)]
    fn test_steps_must_be_in_order() {
        let mut ceremony = Ceremony::start(CeremonyKind::Registration);
        ceremony.advance(CeremonyState::CredentialTrustEstablished);
    }
}
