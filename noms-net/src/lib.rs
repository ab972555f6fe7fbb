//! The chunk-store transport surface: batch chunk framing (`§4.9`), the
//! `ChunkStoreTransport`/`RootStore` traits an HTTP client implements
//! downstream, the `mem` in-process backend, and the protocol version
//! header.

mod framing;
mod mem;
mod transport;
mod version;

pub use framing::{decode_frame, encode_frame};
pub use mem::MemTransport;
pub use transport::{conflict_status_means_cas_lost, ChunkStoreTransport, RootStore};
pub use version::{check_version, PROTOCOL_VERSION};
