// On-wire shape of a batch read response / write request body:
//
//   Frame  := Hints Chunks
//   Hints  := Uint32 count, count * Hash
//   Chunks := repeated Chunk until end-of-buffer
//   Chunk  := Hash, Uint32 length, length bytes
//
// Explicit length-prefixed fields in a fixed order, hash verified on
// decode — the same shape `noms_codec`'s own `Writer`/`Reader` already
// give us, so framing just sequences calls into them rather than
// inventing a second wire format.

use noms_base::{Hash, Result};
use noms_codec::{Chunk, Reader, Writer};

pub fn encode_frame(hints: &[Hash], chunks: &[Chunk]) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_uint32(hints.len() as u32);
    for h in hints {
        w.write_hash(h);
    }
    for c in chunks {
        w.write_hash(&c.hash());
        w.write_bytes(c.bytes());
    }
    w.into_bytes()
}

pub fn decode_frame(bytes: &[u8]) -> Result<(Vec<Hash>, Vec<Chunk>)> {
    let mut r = Reader::new(bytes);
    let hint_count = r.read_uint32()? as usize;
    let mut hints = Vec::with_capacity(hint_count);
    for _ in 0..hint_count {
        hints.push(r.read_hash()?);
    }
    let mut chunks = Vec::new();
    while !r.at_end() {
        let hash = r.read_hash()?;
        let bytes = r.read_bytes()?;
        chunks.push(Chunk::from_hash_and_bytes(hash, bytes)?);
    }
    Ok((hints, chunks))
}

#[cfg(test)]
mod test {
    use super::*;
    use noms_types::Value;
    use test_log::test;

    #[test]
    fn frame_round_trips() {
        let a = noms_codec::encode(&Value::String("a".to_string())).unwrap();
        let b = noms_codec::encode(&Value::Number(noms_types::Number::from_i64(2))).unwrap();
        let hints = vec![Hash::of_bytes(b"hint")];
        let bytes = encode_frame(&hints, &[a.clone(), b.clone()]);
        let (decoded_hints, decoded_chunks) = decode_frame(&bytes).unwrap();
        assert_eq!(decoded_hints, hints);
        assert_eq!(decoded_chunks, vec![a, b]);
    }

    #[test]
    fn empty_frame_round_trips() {
        let bytes = encode_frame(&[], &[]);
        let (hints, chunks) = decode_frame(&bytes).unwrap();
        assert!(hints.is_empty());
        assert!(chunks.is_empty());
    }

    #[test]
    fn tampered_chunk_bytes_fail_hash_verification() {
        let a = noms_codec::encode(&Value::String("a".to_string())).unwrap();
        let mut bytes = encode_frame(&[], &[a]);
        *bytes.last_mut().unwrap() ^= 0xff;
        assert!(decode_frame(&bytes).is_err());
    }
}
