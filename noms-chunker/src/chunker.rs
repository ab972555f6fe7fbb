// A single tree level's accumulator: items accrue until the rolling
// hasher driven by their (caller-supplied, pre-encoded) bytes crosses a
// boundary, at which point the accumulated run is handed back as a
// closed leaf. The multi-level "stack of chunkers" that wires a closed
// leaf at level N into a summary item appended at level N+1 is built by
// whichever caller owns the tree (it alone knows how to turn a run of
// items into the next level's summary, since that requires hashing and
// encoding machinery this crate deliberately doesn't depend on).

use tracing::trace;

use crate::buzhash::BuzHash;

pub struct Chunker<T> {
    hasher: BuzHash,
    pending: Vec<T>,
}

impl<T> Chunker<T> {
    pub fn new(pattern: u64) -> Self {
        Chunker { hasher: BuzHash::new(pattern), pending: Vec::new() }
    }

    /// Add one item's bytes to the rolling hash and hold onto the item.
    /// Returns `true` if the item just closed a chunk boundary; the
    /// caller should then call `take_closed` to drain it.
    pub fn append(&mut self, item: T, encoded_bytes: &[u8]) -> bool {
        self.pending.push(item);
        let mut boundary = false;
        for &b in encoded_bytes {
            self.hasher.roll(b);
            boundary = self.hasher.at_boundary();
        }
        boundary
    }

    /// Drain and return the items accumulated since the last close,
    /// resetting the rolling hash for the next chunk.
    pub fn take_closed(&mut self) -> Vec<T> {
        self.hasher.reset();
        let closed = std::mem::take(&mut self.pending);
        trace!(len = closed.len(), "chunk boundary closed");
        closed
    }

    /// Force-close whatever is pending, for end-of-stream.
    pub fn finish(&mut self) -> Vec<T> {
        self.take_closed()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buzhash::TEST_PATTERN;
    use test_log::test;

    #[test]
    fn closes_deterministically_for_the_same_input() {
        let items: Vec<(u32, Vec<u8>)> =
            (0..2000u32).map(|i| (i, format!("item-{i}").into_bytes())).collect();

        let run = || {
            let mut c: Chunker<u32> = Chunker::new(TEST_PATTERN);
            let mut leaves: Vec<Vec<u32>> = Vec::new();
            for (item, bytes) in &items {
                if c.append(*item, bytes) {
                    leaves.push(c.take_closed());
                }
            }
            let tail = c.finish();
            if !tail.is_empty() {
                leaves.push(tail);
            }
            leaves
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn finish_drains_trailing_partial_chunk() {
        let mut c: Chunker<&str> = Chunker::new(TEST_PATTERN);
        c.append("only-item", b"x");
        let tail = c.finish();
        assert_eq!(tail, vec!["only-item"]);
        assert!(c.is_empty());
    }
}
