// BuzHash: a cyclic-polynomial rolling hash. A fixed, deterministically
// generated 256-entry table maps each byte value to a pseudo-random
// u64; the running hash is `rotl(hash, 1) ^ table[in] ^ rotl(table[out],
// window_size)` once the window is full, so it only ever depends on the
// last WINDOW_SIZE bytes seen.

pub const WINDOW_SIZE: usize = 64;

/// ≈4 KiB average chunk size.
pub const DEFAULT_PATTERN: u64 = (1 << 12) - 1;
/// ≈128 B average chunk size, for tests that want many small chunks.
pub const TEST_PATTERN: u64 = (1 << 7) - 1;

const fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

const fn build_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = splitmix64(i as u64);
        i += 1;
    }
    table
}

static TABLE: [u64; 256] = build_table();

fn rotl(v: u64, by: u32) -> u64 {
    v.rotate_left(by % 64)
}

pub struct BuzHash {
    pattern: u64,
    window: [u8; WINDOW_SIZE],
    pos: usize,
    filled: usize,
    hash: u64,
}

impl BuzHash {
    pub fn new(pattern: u64) -> Self {
        BuzHash { pattern, window: [0; WINDOW_SIZE], pos: 0, filled: 0, hash: 0 }
    }

    pub fn default_pattern() -> Self {
        BuzHash::new(DEFAULT_PATTERN)
    }

    pub fn test_pattern() -> Self {
        BuzHash::new(TEST_PATTERN)
    }

    /// Feed one byte through the window, returning the updated rolling
    /// sum. The caller checks `(sum & pattern) == pattern` to decide
    /// whether a boundary fires here.
    pub fn roll(&mut self, byte_in: u8) -> u64 {
        let out_byte = self.window[self.pos];
        let out_contribution =
            if self.filled == WINDOW_SIZE { rotl(TABLE[out_byte as usize], WINDOW_SIZE as u32) } else { 0 };
        self.hash = rotl(self.hash, 1) ^ TABLE[byte_in as usize] ^ out_contribution;
        self.window[self.pos] = byte_in;
        self.pos = (self.pos + 1) % WINDOW_SIZE;
        if self.filled < WINDOW_SIZE {
            self.filled += 1;
        }
        self.hash
    }

    /// `true` if the most recent `roll` landed on a chunk boundary.
    pub fn at_boundary(&self) -> bool {
        (self.hash & self.pattern) == self.pattern
    }

    pub fn reset(&mut self) {
        self.window = [0; WINDOW_SIZE];
        self.pos = 0;
        self.filled = 0;
        self.hash = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn same_bytes_produce_same_boundaries() {
        let data = b"the quick brown fox jumps over the lazy dog, over and over again";
        let run = |pattern: u64| {
            let mut h = BuzHash::new(pattern);
            let mut boundaries = Vec::new();
            for (i, &b) in data.iter().enumerate() {
                h.roll(b);
                if h.at_boundary() {
                    boundaries.push(i);
                }
            }
            boundaries
        };
        assert_eq!(run(TEST_PATTERN), run(TEST_PATTERN));
    }

    #[test]
    fn smaller_pattern_yields_more_boundaries_on_average() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let count = |pattern: u64| {
            let mut h = BuzHash::new(pattern);
            data.iter().filter(|&&b| { h.roll(b); h.at_boundary() }).count()
        };
        assert!(count(TEST_PATTERN) >= count(DEFAULT_PATTERN));
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut h = BuzHash::new(DEFAULT_PATTERN);
        for b in b"some bytes" {
            h.roll(*b);
        }
        h.reset();
        assert_eq!(h.hash, 0);
        assert_eq!(h.filled, 0);
    }
}
