mod chunk;
mod ioutil;
mod sequence;
mod ty_codec;
mod value_codec;

pub use chunk::{decode, encode, Chunk};
pub use ioutil::{Reader, Writer};
pub use sequence::{DecodedBody, DecodedSequence};
pub use ty_codec::{decode_type, encode_type};
pub use value_codec::{decode_value, encode_value, is_commit};
