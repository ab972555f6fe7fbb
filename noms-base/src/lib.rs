mod bytes;
mod error;
mod hash;

pub use bytes::{
    check_safe_uint64, read_varint_u64, read_zigzag_varint, write_varint_u64,
    write_zigzag_varint, zigzag_decode, zigzag_encode, MAX_SAFE_UINT64,
};
pub use error::{err, kind_err, Error, Kind, Result};
pub use hash::{Hash, HASH_BYTE_LEN};
