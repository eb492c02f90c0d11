//! The canonical-encoding boundary: CTAP2 canonical CBOR ordering and
//! helpers for slicing single data items out of a larger byte sequence.

mod ordered_ser;
mod raw;

pub use ordered_ser::{make_ordered, to_canonical_vec};
pub use raw::{read_map_header, split_item, split_raw_item};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CborError {
    #[error("malformed CBOR: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),

    #[error("CBOR encoding failed: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid CBOR header at offset {0}")]
    Syntax(usize),

    #[error("unexpected CBOR item, expected {0}")]
    UnexpectedItem(&'static str),
}
