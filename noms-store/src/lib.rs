//! The value store: a hash cache, a pluggable value cache (LRU or
//! no-op), a pending-put map, and the read/write/flush algorithms that
//! tie them to a backing `ChunkStore`.

mod chunk_store;
mod hash_cache;
mod value_cache;
mod value_store;

pub use chunk_store::{ChunkStore, MemChunkStore};
pub use hash_cache::{HashCache, HashCacheEntry};
pub use value_cache::{LruValueCache, NoopValueCache, ValueCache};
pub use value_store::{child_refs, ValueStore};
