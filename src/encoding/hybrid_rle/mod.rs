//! Run-length packing of small unsigned integers, used for definition levels
//! and dictionary indices.
//!
//! A stream starts with one byte holding the bit width `w`. Runs follow, each a
//! varint header `run_length << 1` and the repeated value in `ceil(w / 8)`
//! little-endian bytes. A header with the low bit set announces a bit-packed
//! run, which this crate never writes and rejects on read.

mod decoder;
mod encoder;

pub use decoder::{decode_u32, HybridRleDecoder};
pub use encoder::{encode_bool, encode_u32, num_bits_for};
