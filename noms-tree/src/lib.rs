//! Sequences, cursors-as-flattened-access, the chunker-driven tree
//! builder, and splice/diff over `List`/`Set`/`Map`/`Blob` values.

mod access;
mod build;
mod diff;
mod flatten;
mod reader;
mod splice;

pub use access::{get_blob_byte, get_list_item, get_map_entry, get_map_entry_by_hash, get_set_member, get_set_member_by_hash};
pub use build::{build_blob, build_list, build_map, build_set, BuiltTree};
pub use diff::{diff_list, diff_map, diff_set, MapChange, SetChange, Splice, DEFAULT_MAX_MATRIX};
pub use flatten::{flatten_blob, flatten_list, flatten_map, flatten_set};
pub use reader::{ordering_key, value_eq, MapReader, NoReader, ValueReader};
pub use splice::{edit_map, edit_set, splice_blob, splice_list};
