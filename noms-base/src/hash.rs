// A Hash is the 20-byte prefix of a SHA-512 digest over a chunk's bytes.
// Display/parse form is 32 base32 characters (no padding: 20 bytes is
// exactly 160 bits, and 160 / 5 == 32).

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha512};

use crate::error::{kind_err, Kind};
use crate::Result;

pub const HASH_BYTE_LEN: usize = 20;
const HASH_STRING_LEN: usize = 32;
const BASE32_ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Content address: the leading 20 bytes of `SHA512(bytes)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash([u8; HASH_BYTE_LEN]);

impl Hash {
    /// The all-zero hash, used to mean "absence" for an empty chunk.
    pub const EMPTY: Hash = Hash([0; HASH_BYTE_LEN]);

    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut out = [0u8; HASH_BYTE_LEN];
        out.copy_from_slice(&digest[..HASH_BYTE_LEN]);
        Hash(out)
    }

    pub fn from_bytes(bytes: [u8; HASH_BYTE_LEN]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_BYTE_LEN] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; HASH_BYTE_LEN]
    }

    fn to_base32(&self) -> String {
        let mut out = String::with_capacity(HASH_STRING_LEN);
        for i in 0..HASH_STRING_LEN {
            let mut val: u8 = 0;
            for j in 0..5 {
                let pos = i * 5 + j;
                let byte = self.0[pos / 8];
                let shift = 7 - (pos % 8);
                let bit = (byte >> shift) & 1;
                val = (val << 1) | bit;
            }
            out.push(BASE32_ALPHABET[val as usize] as char);
        }
        out
    }

    fn from_base32(s: &str) -> Result<Self> {
        if s.len() != HASH_STRING_LEN || !s.is_ascii() {
            return Err(kind_err(Kind::Syntax, format!("invalid hash: {s}")));
        }
        let mut bytes = [0u8; HASH_BYTE_LEN];
        for (i, c) in s.bytes().enumerate() {
            let val = BASE32_ALPHABET
                .iter()
                .position(|&a| a == c.to_ascii_lowercase())
                .ok_or_else(|| kind_err(Kind::Syntax, format!("invalid hash: {s}")))?;
            for j in 0..5 {
                let pos = i * 5 + j;
                let bit = ((val >> (4 - j)) & 1) as u8;
                bytes[pos / 8] |= bit << (7 - (pos % 8));
            }
        }
        Ok(Hash(bytes))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base32())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_base32())
    }
}

impl FromStr for Hash {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<Self> {
        Hash::from_base32(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn round_trips_through_base32() {
        let h = Hash::of_bytes(b"abc");
        let s = h.to_string();
        assert_eq!(s.len(), HASH_STRING_LEN);
        assert_eq!(s.parse::<Hash>().unwrap(), h);
    }

    #[test]
    fn empty_is_all_zero() {
        assert!(Hash::EMPTY.is_empty());
        assert_eq!(Hash::EMPTY.to_string(), "0".repeat(HASH_STRING_LEN));
    }

    #[test]
    fn rejects_bad_length_and_alphabet() {
        assert!("too-short".parse::<Hash>().is_err());
        // 'z' is outside 0-9a-v
        assert!("z"
            .repeat(HASH_STRING_LEN)
            .parse::<Hash>()
            .is_err());
    }

    #[test]
    fn comparison_is_lexicographic_over_bytes() {
        let a = Hash::from_bytes([0u8; HASH_BYTE_LEN]);
        let mut bytes = [0u8; HASH_BYTE_LEN];
        bytes[HASH_BYTE_LEN - 1] = 1;
        let b = Hash::from_bytes(bytes);
        assert!(a < b);
    }
}
