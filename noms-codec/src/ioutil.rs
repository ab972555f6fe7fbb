// A Writer/Reader pair over a plain in-memory buffer, scoped to exactly
// the wire primitives the codec needs. Unlike a general-purpose byte
// pipe there is no seeking: a chunk is always encoded and decoded whole.

use noms_base::{
    check_safe_uint64, kind_err, read_varint_u64, read_zigzag_varint, write_varint_u64,
    write_zigzag_varint, Hash, Kind, Result, HASH_BYTE_LEN,
};

#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_uint8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_uint8(if v { 1 } else { 0 });
    }

    pub fn write_uint32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_uint64(&mut self, v: u64) -> Result<()> {
        check_safe_uint64(v)?;
        self.write_uint32((v >> 32) as u32);
        self.write_uint32(v as u32);
        Ok(())
    }

    pub fn write_varint_u64(&mut self, v: u64) {
        write_varint_u64(&mut self.buf, v);
    }

    pub fn write_zigzag_varint(&mut self, v: i64) {
        write_zigzag_varint(&mut self.buf, v);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_uint32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn write_hash(&mut self, h: &Hash) {
        self.buf.extend_from_slice(h.as_bytes());
    }
}

pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Decode must be called last by the caller: every byte of the
    /// chunk is expected to be consumed by the time this returns true.
    pub fn at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(kind_err(Kind::Integrity, "truncated chunk"));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_uint8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_uint8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(kind_err(Kind::Integrity, format!("invalid bool byte {other}"))),
        }
    }

    pub fn read_uint32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_uint64(&mut self) -> Result<u64> {
        let hi = self.read_uint32()? as u64;
        let lo = self.read_uint32()? as u64;
        let v = (hi << 32) | lo;
        check_safe_uint64(v)?;
        Ok(v)
    }

    pub fn read_varint_u64(&mut self) -> Result<u64> {
        read_varint_u64(self.buf, &mut self.pos)
    }

    pub fn read_zigzag_varint(&mut self) -> Result<i64> {
        read_zigzag_varint(self.buf, &mut self.pos)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_uint32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn read_str(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|e| kind_err(Kind::Integrity, e.to_string()))
    }

    pub fn read_hash(&mut self) -> Result<Hash> {
        let b = self.take(HASH_BYTE_LEN)?;
        let mut out = [0u8; HASH_BYTE_LEN];
        out.copy_from_slice(b);
        Ok(Hash::from_bytes(out))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn primitives_round_trip() {
        let mut w = Writer::new();
        w.write_bool(true);
        w.write_uint32(0xdeadbeef);
        w.write_uint64(12345).unwrap();
        w.write_zigzag_varint(-7);
        w.write_str("hello");
        w.write_hash(&Hash::of_bytes(b"x"));
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_bool().unwrap(), true);
        assert_eq!(r.read_uint32().unwrap(), 0xdeadbeef);
        assert_eq!(r.read_uint64().unwrap(), 12345);
        assert_eq!(r.read_zigzag_varint().unwrap(), -7);
        assert_eq!(r.read_str().unwrap(), "hello");
        assert_eq!(r.read_hash().unwrap(), Hash::of_bytes(b"x"));
        assert!(r.at_end());
    }

    #[test]
    fn truncated_read_is_an_error() {
        let mut r = Reader::new(&[0u8; 2]);
        assert!(r.read_uint32().is_err());
    }
}
