//! Fixtures shared by the unit tests: ring-backed key pairs and builders for
//! authenticator data and attestation objects.

use ciborium::value::Value;
use coset::{iana, AsCborValue, CoseKeyBuilder, KeyType, Label};
use once_cell::sync::Lazy;
use ring::{
    rand::SystemRandom,
    signature::{
        EcdsaKeyPair, Ed25519KeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING,
        ECDSA_P384_SHA384_ASN1_SIGNING,
    },
};

use crate::{
    attestation::AttestationObject,
    authenticator_data::{AttestedCredData, AuthenticatorData, AuthenticatorDataFlags},
    crypto::{sha256, CoseAlgorithm, CoseKey},
    types::{Aaguid, ClientDataHash, CredentialId},
};

/// ES256 key from a captured registration, in canonical order.
pub const RAW_P256_KEY: &str = concat!(
    "a5010203262001",
    "21582036c485f883dacfb363c8f64d6a82e5653d7d36642b3a108b51555a8d33407d5c",
    "22582069c952214fce43ea5f804310bbe63e0deecbf1e9ba695dac7753b131bcbff398",
);

/// A "none" attestation object: 164 bytes of authenticator data with
/// UP and AT set, sign count 1, a zero AAGUID, a 32 byte credential id and the
/// key above.
pub const RAW_NONE_ATTESTATION_OBJECT: &str = concat!(
    "a363666d74646e6f6e656761747453746d74a068617574684461746158a4",
    "d833514080a0c72b1efa42b18c96b9273e9f193fa980db09a09333865c2b32f3",
    "41",
    "00000001",
    "00000000000000000000000000000000",
    "0020",
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
    "a5010203262001",
    "21582036c485f883dacfb363c8f64d6a82e5653d7d36642b3a108b51555a8d33407d5c",
    "22582069c952214fce43ea5f804310bbe63e0deecbf1e9ba695dac7753b131bcbff398",
);

pub const RP_ID: &str = "e3b0c442.io";

/// Message signed by the fixed RSA and P-521 signatures below.
pub const SIGNED_MESSAGE: &[u8] = b"message";

pub const RSA_EXPONENT: &str = "010001";

/// Modulus of a 2048-bit RSA key.
pub const RSA_2048_N: &str = concat!(
    "ebd38122dd6a02fff8647f1a083d4fb50e2d10a8f47aaffacb989593977be391308ee2277b028ab32c4fd21528bf70e4",
    "9898375e4680f169221a82f943b78338e0e24f9373c874ac56578517f464ef383dd6727e843f2e53d81fbbd81674c57a",
    "d7e48f307ccc838acbfac49ae4398e3cb98dc60a8716f8ca59955611f3db9a7734f378e93b2b37dd5917621aada0b34b",
    "cdb4cfe43a0f876456ba01a2185cd44d90c2f162a4a85ae25787dca5be31e97c52a08d7659cfa9425dbdd5b7b911451f",
    "b5aff4238d480994688bee4d987fdab78f0694b9e681aa39adfcd5d1af961a16c7e727ed83047e293aaf0a9ef4ac6ed1",
    "a5e48404afe2504618c7dc370f1e6f05",
);

pub const RSA_2048_RS256_SIG: &str = concat!(
    "cd301953b3dd9387f805ebf5697d61a41fc20f31553885647d5f7c0ec22b71dbd5b7d93fefe7b947fa28f9f7f70b6e54",
    "60b80f9b171e2a509df478673de74cb365afe02f21f1885c8c4ce07bc099dd98e14d645e7a603af2ec2406d8151a7d11",
    "b83c1009f6af3b26d3615038f76b954bdc99790c63eef3748d61dd86aa3515598bb0b045736ac89b9083c6bfa6e55241",
    "5fdb26bf8ec3ecc27dcb782d54bf6e9c9513f3201126535b74ee4dc39baff6581ff8a49f9e705a3cc0ce6364ea10f215",
    "82ee8df03e8c917d08f19c08cb11e3d0d99a7ba3a411bdfe376e76a3bbced22d6717f0cb94bd08163f45b48c6d8545f9",
    "e7cb95b0ad36b06ad56f7376583a1bd8",
);

/// PSS with a 32 byte salt.
pub const RSA_2048_PS256_SIG: &str = concat!(
    "379ae3bbc6a27ad0f57febae646ffb82c151bafcc4cb31666fdba56c88cbc21c9f6a6203b53fd8342cbbd32ac5fddd36",
    "0cd27f4d78d0478e2bc74dd95dd3a8b0ea90b5a3a97710b2c9367f395f54a239a157dc97b7ae6b03e130cb69b6a768da",
    "9e1c70d53b539a26270bb2476b67198f6a443125c5141f91520401ff17a059667f6761622c88beea8193342a1e4f2ace",
    "75a9cf7d7ccda74b41ee1e9b1ed594d6e3682f3c3cb5d9f69c6e4a6f992a48d9904312bae0c9325b89807215c6a5349e",
    "3aff7bd8977c96770a0438f527bf9122ab8afe5ddee7382ed7900d3dc3ce0036ce498b19648601c04069b14d76f52bf7",
    "4c20f62b6fa5c0441b9b2e713f0a4526",
);

/// Modulus of a 1024-bit RSA key.
pub const RSA_1024_N: &str = concat!(
    "cf9152214ad1ff28622102acf0666fa82b6529a7fbd21abad450fbc9c26770452b892ef9bb7202deb44a98a30f62513a",
    "15ae0b8ccf2ea11d8a4d95645967923d43dd10e01185c060eaa73d9f2e7676aba1894bac3f094540603fbfca89e8ab22",
    "763ba6500d8c1bc7d94943b3af10b30e31f23aa5ee95f2925e13c1a19720a555",
);

pub const RSA_1024_RS256_SIG: &str = concat!(
    "890cb11ac076ceb562abc65bd8c817f902505736ee1a1183b4ba8a6654b3e563ef8547c82d74b582bb08258351160f10",
    "c6959ed812e29c5ab1ee3d783cfc7ca68d8e2ce868331e89c3e5d3b63e70a174082c5136b2d17c627c987ecdc9375b1d",
    "830214696e63dfe3c6b86e18f9984e8262329941e7dbf9729ec7d89c6f5ac086",
);

pub const RSA_1024_RS1_SIG: &str = concat!(
    "61f80c45f1251d7fb38cc400a4c70e1fae281959c132b69d73e042492b8f9db4c2dc0f9dc48aa79a41b8116fcfc52c8a",
    "a18065adf47a561c4b5e10b98af9f0f85c8856e6257dea0164053eff18a1bddd3cb2a453485bdc79234f553cf2fd0a7d",
    "664b4c59be2b5f0ffa19e78acd02a7a6a32796e4b0e118d0917ff12a0ddeb895",
);

pub const RSA_1024_RS384_SIG: &str = concat!(
    "226b14c0bb8de69aa7585b56c6eb8fdefeb3ec0ed91ea70b762a3b63170cb49dfe47e17f867f3933a638961e3eeefc3c",
    "34b4364b280433b6a4d8da923b1f8fe33ee00e21fad2ddab1897b872d3a4486ad850766ee0072e71b26f7a8626a5586c",
    "74dfad0c43a30041211acca9fca7c5d1dafe8da0c0a80e4ac0dfd4bdaa56ffba",
);

/// Coordinates of a P-521 public key.
pub const P521_X: &str = concat!(
    "000df4d0f134189237142f243f645d63ad224b112c936f7e0e7f3780f31dc07bf9c908cc190bb604c295a224d19c2627",
    "dbeab49a55dcaffb1a703b7e6567a4da2c54",
);

pub const P521_Y: &str = concat!(
    "00ff0997604cbf915f8c6fc8bd446564a38e041820959f5a0136df7ca6b8c3bde98d8f63e262a49f40729e9b7dce7fcd",
    "96c4ecb7ca60489a28eb9032270e29c39001",
);

pub const P521_ES512_SIG: &str = concat!(
    "3081880242008bbd4fae30907d20f55420a59bfc1710975f5948b5b552efd8f0f7ec14b79660ff6564240f86bf447ea7",
    "ed9acd80a8757b3e8f5c700fff41291b3457ce6c593eef0242013d3a9f5cbb677928c23a2c84a6e84f011d09b5c71cb8",
    "12c518df835e4721994f18784e25b00ad3832fdd51179b2243899124316f7c57bbbc806f55d7b947e2b347",
);

/// Self-signed P-256 attestation certificate: v3, not a CA, AAGUID extension
/// naming [ATTESTATION_AAGUID].
pub const ATTESTATION_CERT: &str = concat!(
    "308201ec30820192a003020102020101300a06082a8648ce3d0403023064310b3009060355040613025553310f300d06",
    "0355040a0c06736f6674727031223020060355040b0c1941757468656e74696361746f72204174746573746174696f6e",
    "3120301e06035504030c17736f667472702074657374206174746573746174696f6e3020170d32343031303130303030",
    "30305a180f32313233313230383030303030305a3064310b3009060355040613025553310f300d060355040a0c06736f",
    "6674727031223020060355040b0c1941757468656e74696361746f72204174746573746174696f6e3120301e06035504",
    "030c17736f667472702074657374206174746573746174696f6e3059301306072a8648ce3d020106082a8648ce3d0301",
    "07034200040919eafd343b19f4a2c3539f7524bc72208b018014af52f3b848a07d4dc0f0fc3af9bc00ae7afdc95651fe",
    "9a7513e2d31147053275826651cf0c6305595c9581a3333031300c0603551d130101ff040230003021060b2b06010401",
    "82e51c0101040412041011111111111111111111111111111111300a06082a8648ce3d0403020348003045022027b6f7",
    "ad699fe77f9e33bb660d770701cd3017cb9b77c1d6ff123dfa35a7dbb1022100be3d3ba8246e9c1875e8fbc71b767c5e",
    "ca76ef642fc385364f7463e244dd7286",
);

/// Same subject and key as [ATTESTATION_CERT], but marked as a CA.
pub const ATTESTATION_CA_CERT: &str = concat!(
    "308201ef30820195a003020102020102300a06082a8648ce3d0403023064310b3009060355040613025553310f300d06",
    "0355040a0c06736f6674727031223020060355040b0c1941757468656e74696361746f72204174746573746174696f6e",
    "3120301e06035504030c17736f667472702074657374206174746573746174696f6e3020170d32343031303130303030",
    "30305a180f32313233313230383030303030305a3064310b3009060355040613025553310f300d060355040a0c06736f",
    "6674727031223020060355040b0c1941757468656e74696361746f72204174746573746174696f6e3120301e06035504",
    "030c17736f667472702074657374206174746573746174696f6e3059301306072a8648ce3d020106082a8648ce3d0301",
    "07034200040919eafd343b19f4a2c3539f7524bc72208b018014af52f3b848a07d4dc0f0fc3af9bc00ae7afdc95651fe",
    "9a7513e2d31147053275826651cf0c6305595c9581a3363034300f0603551d130101ff040530030101ff3021060b2b06",
    "01040182e51c0101040412041011111111111111111111111111111111300a06082a8648ce3d04030203480030450221",
    "00b9b5f1c993cb8a23b0ecc45614b12f3b6a5abc87707b0549dfbf919fdb2af1b702204ef444a6dc9ee93e41e1604205",
    "81c9e100f4ec677c2a361bb656917066ff8c75",
);

/// Same subject and key as [ATTESTATION_CERT], without the AAGUID extension.
pub const ATTESTATION_CERT_NO_AAGUID: &str = concat!(
    "308201c93082016fa003020102020101300a06082a8648ce3d0403023064310b3009060355040613025553310f300d06",
    "0355040a0c06736f6674727031223020060355040b0c1941757468656e74696361746f72204174746573746174696f6e",
    "3120301e06035504030c17736f667472702074657374206174746573746174696f6e3020170d32343031303130303030",
    "30305a180f32313233313230383030303030305a3064310b3009060355040613025553310f300d060355040a0c06736f",
    "6674727031223020060355040b0c1941757468656e74696361746f72204174746573746174696f6e3120301e06035504",
    "030c17736f667472702074657374206174746573746174696f6e3059301306072a8648ce3d020106082a8648ce3d0301",
    "07034200040919eafd343b19f4a2c3539f7524bc72208b018014af52f3b848a07d4dc0f0fc3af9bc00ae7afdc95651fe",
    "9a7513e2d31147053275826651cf0c6305595c9581a310300e300c0603551d130101ff04023000300a06082a8648ce3d",
    "0403020348003045022060e6d78afdb96810c87a5b422bb51b4ee94ba537a588ab9c4c29b6621c60f670022100b59786",
    "5c2282a1fa6a17b6889836b7e5d2d1b54b0f90e52b9ae5c592334bb561",
);

/// PKCS#8 private key of the attestation certificates.
pub const ATTESTATION_KEY_PKCS8: &str = concat!(
    "308187020100301306072a8648ce3d020106082a8648ce3d030107046d306b0201010420cb7ddae6b88aedeb4770f297",
    "5f570424a80f57ae0abebc90e487bec04d18d3aaa144034200040919eafd343b19f4a2c3539f7524bc72208b018014af",
    "52f3b848a07d4dc0f0fc3af9bc00ae7afdc95651fe9a7513e2d31147053275826651cf0c6305595c9581",
);

pub const ATTESTATION_AAGUID: Aaguid = Aaguid([0x11; 16]);

pub static P256_KEY: Lazy<TestKeyPair> = Lazy::new(|| TestKeyPair::generate(CoseAlgorithm::ES256));
pub static P384_KEY: Lazy<TestKeyPair> = Lazy::new(|| TestKeyPair::generate(CoseAlgorithm::ES384));
pub static ED25519_KEY: Lazy<TestKeyPair> =
    Lazy::new(|| TestKeyPair::generate(CoseAlgorithm::EdDSA));
pub static ATTESTATION_KEY: Lazy<TestKeyPair> = Lazy::new(|| {
    let pkcs8 = hex::decode(ATTESTATION_KEY_PKCS8).unwrap();
    let alg = &ECDSA_P256_SHA256_ASN1_SIGNING;
    TestKeyPair::P256(EcdsaKeyPair::from_pkcs8(alg, &pkcs8, &SystemRandom::new()).unwrap())
});

pub enum TestKeyPair {
    P256(EcdsaKeyPair),
    P384(EcdsaKeyPair),
    Ed25519(Ed25519KeyPair),
}

impl TestKeyPair {
    pub fn generate(alg: CoseAlgorithm) -> Self {
        let rng = SystemRandom::new();
        match alg {
            CoseAlgorithm::ES256 => {
                let alg = &ECDSA_P256_SHA256_ASN1_SIGNING;
                let doc = EcdsaKeyPair::generate_pkcs8(alg, &rng).unwrap();
                TestKeyPair::P256(EcdsaKeyPair::from_pkcs8(alg, doc.as_ref(), &rng).unwrap())
            }
            CoseAlgorithm::ES384 => {
                let alg = &ECDSA_P384_SHA384_ASN1_SIGNING;
                let doc = EcdsaKeyPair::generate_pkcs8(alg, &rng).unwrap();
                TestKeyPair::P384(EcdsaKeyPair::from_pkcs8(alg, doc.as_ref(), &rng).unwrap())
            }
            CoseAlgorithm::EdDSA => {
                let doc = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
                TestKeyPair::Ed25519(Ed25519KeyPair::from_pkcs8(doc.as_ref()).unwrap())
            }
            other => panic!("no test key pair for {:?}", other),
        }
    }

    /// Exports the public half through coset, so decoding is checked against an
    /// independent encoder.
    pub fn to_public_cose_key(&self) -> CoseKey {
        let key = match self {
            TestKeyPair::P256(key) | TestKeyPair::P384(key) => {
                // 0x04 || x || y
                let octet_string = key.public_key().as_ref();
                assert_eq!(octet_string[0], 0x04, "Public key must be in uncompressed form");
                let (x, y) = octet_string[1..].split_at((octet_string.len() - 1) / 2);
                let (curve, alg) = match self {
                    TestKeyPair::P256(_) => (iana::EllipticCurve::P_256, iana::Algorithm::ES256),
                    _ => (iana::EllipticCurve::P_384, iana::Algorithm::ES384),
                };
                CoseKeyBuilder::new_ec2_pub_key(curve, x.to_owned(), y.to_owned())
                    .algorithm(alg)
                    .build()
            }
            TestKeyPair::Ed25519(key) => {
                let x = key.public_key().as_ref();
                assert_eq!(x.len(), 32);
                coset::CoseKey {
                    kty: KeyType::Assigned(iana::KeyType::OKP),
                    alg: Some(coset::Algorithm::Assigned(iana::Algorithm::EdDSA)),
                    params: vec![
                        (
                            Label::Int(iana::Ec2KeyParameter::Crv as i64),
                            Value::from(iana::EllipticCurve::Ed25519 as u64),
                        ),
                        (
                            Label::Int(iana::Ec2KeyParameter::X as i64),
                            Value::Bytes(x.to_owned()),
                        ),
                    ],
                    ..Default::default()
                }
            }
        };
        CoseKey::from_cbor_value(key.to_cbor_value().unwrap()).unwrap()
    }

    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        match self {
            TestKeyPair::P256(key) | TestKeyPair::P384(key) => {
                let rng = SystemRandom::new();
                key.sign(&rng, data).unwrap().as_ref().to_owned()
            }
            TestKeyPair::Ed25519(key) => key.sign(data).as_ref().to_owned(),
        }
    }
}

pub fn rp_id_hash(rp_id: &str) -> [u8; 32] {
    sha256(rp_id.as_bytes())
}

pub fn client_data_hash() -> ClientDataHash {
    ClientDataHash(sha256(br#"{"type":"webauthn.create","challenge":"AAAA","origin":"https://e3b0c442.io"}"#))
}

/// Registration-style authenticator data: UP and AT set.
pub fn registration_auth_data(
    rp_id: &str,
    credential_id: &[u8],
    public_key: CoseKey,
    sign_count: u32,
) -> AuthenticatorData {
    AuthenticatorData {
        rp_id_hash: rp_id_hash(rp_id),
        flags: AuthenticatorDataFlags::new()
            .with_user_present(true)
            .with_attested_data_included(true),
        sign_count,
        attested_cred_data: Some(AttestedCredData {
            aaguid: Aaguid::default(),
            credential_id: CredentialId(credential_id.to_vec()),
            credential_public_key: public_key,
        }),
        extensions: None,
    }
}

/// Assertion-style authenticator data: UP set, no attested credential data.
pub fn assertion_auth_data(rp_id: &str, sign_count: u32) -> AuthenticatorData {
    AuthenticatorData {
        rp_id_hash: rp_id_hash(rp_id),
        flags: AuthenticatorDataFlags::new().with_user_present(true),
        sign_count,
        attested_cred_data: None,
        extensions: None,
    }
}

pub fn none_attestation_object(auth_data: &AuthenticatorData) -> Vec<u8> {
    AttestationObject {
        fmt: "none".to_owned(),
        att_stmt: vec![0xa0],
        auth_data: auth_data.to_vec().unwrap(),
    }
    .to_vec()
    .unwrap()
}
