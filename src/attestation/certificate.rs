use x509_parser::{certificate::X509Certificate, prelude::FromDer, x509::X509Version};

use crate::{
    crypto::{verify_with_public_key, CoseAlgorithm},
    error::{ErrorKind, Result},
    types::Aaguid,
};

/// id-fido-gen-ce-aaguid
const OID_FIDO_GEN_CE_AAGUID: &str = "1.3.6.1.4.1.45724.1.1.4";

/// The parts of an attestation certificate the statement verifiers look at.
#[derive(Debug)]
pub(super) struct AttestationCertificate {
    pub version_3: bool,
    pub is_ca: bool,
    pub aaguid: Option<Aaguid>,
    public_key: Vec<u8>,
}

impl AttestationCertificate {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|err| ErrorKind::VerifyAttestation.wrap(format!("invalid attestation certificate: {}", err)))?;

        let is_ca = cert
            .basic_constraints()
            .map_err(|err| ErrorKind::VerifyAttestation.wrap(format!("invalid basic constraints: {}", err)))?
            .map_or(false, |ext| ext.value.ca);

        let mut aaguid = None;
        for ext in cert.extensions() {
            if ext.oid.to_id_string() != OID_FIDO_GEN_CE_AAGUID {
                continue;
            }
            if ext.critical {
                return Err(ErrorKind::VerifyAttestation.detail("AAGUID extension must not be critical"));
            }
            aaguid = Some(parse_aaguid_extension(ext.value)?);
        }

        Ok(AttestationCertificate {
            version_3: cert.version() == X509Version::V3,
            is_ca,
            aaguid,
            public_key: cert.public_key().subject_public_key.data.to_vec(),
        })
    }

    /// Verifies `signature` over `message` with the certificate's subject key.
    pub fn verify(&self, alg: CoseAlgorithm, message: &[u8], signature: &[u8]) -> Result<()> {
        verify_with_public_key(alg, &self.public_key, message, signature)
            .map_err(|err| ErrorKind::VerifyAttestation.wrap(err))
    }

    /// Fails if the certificate names an AAGUID other than `aaguid`.
    pub fn check_aaguid(&self, aaguid: &Aaguid) -> Result<()> {
        match &self.aaguid {
            Some(cert_aaguid) if cert_aaguid != aaguid => Err(ErrorKind::VerifyAttestation.detail(format!(
                "certificate AAGUID {:?} does not match attested AAGUID {:?}",
                cert_aaguid, aaguid
            ))),
            _ => Ok(()),
        }
    }
}

/// The extension value is a DER OCTET STRING holding the 16 byte AAGUID.
fn parse_aaguid_extension(value: &[u8]) -> Result<Aaguid> {
    match value {
        [0x04, 0x10, aaguid @ ..] if aaguid.len() == 16 => {
            let mut out = [0u8; 16];
            out.copy_from_slice(aaguid);
            Ok(Aaguid(out))
        }
        _ => Err(ErrorKind::VerifyAttestation.detail("malformed AAGUID extension")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{
        ATTESTATION_AAGUID, ATTESTATION_CA_CERT, ATTESTATION_CERT, ATTESTATION_CERT_NO_AAGUID, ATTESTATION_KEY,
    };

    fn parse(cert: &str) -> AttestationCertificate {
        AttestationCertificate::from_der(&hex::decode(cert).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_certificates() {
        let cert = parse(ATTESTATION_CERT);
        assert!(cert.version_3);
        assert!(!cert.is_ca);
        assert_eq!(cert.aaguid, Some(ATTESTATION_AAGUID));
        assert_eq!(cert.public_key[0], 0x04);
        assert_eq!(cert.public_key.len(), 65);

        assert!(parse(ATTESTATION_CA_CERT).is_ca);
        assert_eq!(parse(ATTESTATION_CERT_NO_AAGUID).aaguid, None);
    }

    #[test]
    fn test_verify_with_certificate_key() {
        let cert = parse(ATTESTATION_CERT);
        let sig = ATTESTATION_KEY.sign(b"signed data");
        cert.verify(CoseAlgorithm::ES256, b"signed data", &sig).unwrap();
        let err = cert.verify(CoseAlgorithm::ES256, b"other data", &sig).unwrap_err();
        assert_eq!(err, ErrorKind::VerifyAttestation);
        assert!(err.is(ErrorKind::VerifySignature));
    }

    #[test]
    fn test_parse_aaguid_extension() {
        let mut value = vec![0x04, 0x10];
        value.extend_from_slice(&[0xab; 16]);
        assert_eq!(parse_aaguid_extension(&value).unwrap(), Aaguid([0xab; 16]));

        assert!(parse_aaguid_extension(&value[..17]).is_err());
        value.push(0x00);
        assert!(parse_aaguid_extension(&value).is_err());
        assert!(parse_aaguid_extension(&[0x03, 0x10]).is_err());
    }

    #[test]
    fn test_rejects_garbage_certificate() {
        let err = AttestationCertificate::from_der(&[0x30, 0x03, 0x02, 0x01, 0x00]).unwrap_err();
        assert_eq!(err, ErrorKind::VerifyAttestation);
    }

    #[test]
    fn test_check_aaguid() {
        let cert = AttestationCertificate {
            version_3: true,
            is_ca: false,
            aaguid: Some(Aaguid([1; 16])),
            public_key: vec![],
        };
        cert.check_aaguid(&Aaguid([1; 16])).unwrap();
        assert_eq!(cert.check_aaguid(&Aaguid([2; 16])).unwrap_err(), ErrorKind::VerifyAttestation);

        let cert = AttestationCertificate { aaguid: None, ..cert };
        cert.check_aaguid(&Aaguid([2; 16])).unwrap();
    }
}
