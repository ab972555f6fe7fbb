// The backing store's network-facing surface: batch chunk fetch/put and
// an optimistic-CAS root endpoint. An actual HTTP client sits behind
// these traits in deployment; this crate only specifies the interface
// the core talks to, per the out-of-scope note on the transport itself.

use noms_base::{Hash, Result};
use noms_codec::Chunk;

pub trait ChunkStoreTransport: Send + Sync {
    fn get_batch(&self, hashes: &[Hash]) -> Result<Vec<Chunk>>;
    fn put_batch(&self, chunks: Vec<Chunk>, hints: Vec<Hash>) -> Result<()>;
}

/// `updateRoot(current, last) -> bool`, logically. An HTTP 409 response
/// maps to `Ok(false)` (lost the race) rather than an error; any other
/// non-success status is a transport error.
pub trait RootStore: Send + Sync {
    fn root(&self) -> Result<Hash>;
    fn update_root(&self, current: Hash, last: Hash) -> Result<bool>;
}

/// HTTP 409 means "somebody else updated the root first" — a normal CAS
/// loss, not a transport failure.
pub fn conflict_status_means_cas_lost(status: u16) -> bool {
    status == 409
}
