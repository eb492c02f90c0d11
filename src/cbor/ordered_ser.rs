use std::cmp::Ordering;

use ciborium::value::Value;

use super::CborError;

fn encode(value: &Value) -> Result<Vec<u8>, CborError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)?;
    Ok(buf)
}

/// CTAP2 canonical key order: shorter encodings first, then bytewise.
fn cmp_encoded(k1: &[u8], k2: &[u8]) -> Ordering {
    k1.len().cmp(&k2.len()).then_with(|| k1.cmp(k2))
}

/// Given a CBOR value, modifies it such that any map within it is ordered according to
/// the CTAP2 canonical CBOR encoding scheme.
pub fn make_ordered(value: &mut Value) -> Result<(), CborError> {
    match value {
        Value::Tag(_t, v) => make_ordered(v)?,
        Value::Array(vals) => {
            for v in vals {
                make_ordered(v)?;
            }
        }
        Value::Map(m) => {
            let mut keyed = Vec::with_capacity(m.len());
            for (mut k, mut v) in std::mem::take(m) {
                make_ordered(&mut k)?;
                make_ordered(&mut v)?;
                keyed.push((encode(&k)?, k, v));
            }
            keyed.sort_by(|(e1, ..), (e2, ..)| cmp_encoded(e1, e2));
            *m = keyed.into_iter().map(|(_, k, v)| (k, v)).collect();
        }
        _ => {}
    }
    Ok(())
}

/// Encodes `value` with every nested map in canonical order.
pub fn to_canonical_vec(value: &Value) -> Result<Vec<u8>, CborError> {
    let mut ordered = value.clone();
    make_ordered(&mut ordered)?;
    encode(&ordered)
}
