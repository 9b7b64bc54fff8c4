//! Serialization primitives shared by page headers and file metadata.

pub mod compact;
pub mod varint;

pub use compact::{FieldType, TCompactInputProtocol, TCompactOutputProtocol};
