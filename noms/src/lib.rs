//! Client facade: re-exports the constituent crates' public surface under
//! one name, so a caller can depend on `noms` alone.

pub use noms_base::{err, kind_err, Error, Hash, Kind, Result};
pub use noms_chunker::{BuzHash, Chunker, DEFAULT_PATTERN, TEST_PATTERN, WINDOW_SIZE};
pub use noms_codec::{decode, encode, Chunk, Reader, Writer};
pub use noms_db::{
    commit_type, parse_dataset_spec, parse_path, resolve, Annotation, CommitOptions, DatasetSpec, Database, DbSpec,
    IndexValue, Part, Path, Tail,
};
pub use noms_net::{check_version, ChunkStoreTransport, MemTransport, RootStore, PROTOCOL_VERSION};
pub use noms_store::{ChunkStore, LruValueCache, MemChunkStore, NoopValueCache, ValueCache, ValueStore};
pub use noms_tree::{
    build_blob, build_list, build_map, build_set, diff_list, diff_map, diff_set, edit_map, edit_set, flatten_blob,
    flatten_list, flatten_map, flatten_set, get_blob_byte, get_list_item, get_map_entry, get_map_entry_by_hash,
    get_set_member, get_set_member_by_hash, splice_blob, splice_list, BuiltTree, MapChange, MapReader, NoReader,
    SetChange, Splice, ValueReader,
};
pub use noms_types::{
    bool_type, looks_like_commit_type, make_list_type, make_map_type, make_ref_type, make_set_type, number_type,
    string_type, value_type, MetaTuple, Number, Ref, Struct, Type, Value,
};
