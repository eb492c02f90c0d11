use std::io::Cursor;

use ciborium::value::Value;
use ciborium_ll::{Decoder, Header};

use super::CborError;

/// Decodes exactly one data item from the front of `bytes`, returning it
/// along with whatever follows it.
pub fn split_item(bytes: &[u8]) -> Result<(Value, &[u8]), CborError> {
    let mut cursor = Cursor::new(bytes);
    let value: Value = ciborium::de::from_reader(&mut cursor)?;
    let consumed = cursor.position() as usize;
    Ok((value, &bytes[consumed..]))
}

/// Like [split_item], but returns the item's exact bytes instead of a decoded value.
pub fn split_raw_item(bytes: &[u8]) -> Result<(&[u8], &[u8]), CborError> {
    let (_, rest) = split_item(bytes)?;
    let len = bytes.len() - rest.len();
    Ok((&bytes[..len], rest))
}

/// Reads a definite-length map header, returning the number of entries and the
/// bytes following the header.
pub fn read_map_header(bytes: &[u8]) -> Result<(usize, &[u8]), CborError> {
    let mut decoder = Decoder::from(bytes);
    let header = decoder.pull().map_err(|err| match err {
        ciborium_ll::Error::Io(err) => CborError::Io(err),
        ciborium_ll::Error::Syntax(offset) => CborError::Syntax(offset),
    })?;
    match header {
        Header::Map(Some(len)) => {
            let offset = decoder.offset();
            Ok((len, &bytes[offset..]))
        }
        _ => Err(CborError::UnexpectedItem("a definite-length map")),
    }
}
