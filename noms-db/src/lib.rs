//! The path language, dataset-spec grammar, commit shape, and the
//! `Database` that ties a `ValueStore` and a `RootStore` together into
//! versioned, optimistically-concurrent dataset commits.

mod commit;
mod database;
mod dataset_spec;
mod path;
mod resolve;

pub use commit::{build_commit_value, commit_type, descends_from};
pub use database::{CommitOptions, Database, TransportChunkStore};
pub use dataset_spec::{parse_dataset_spec, DatasetSpec, DbSpec, Tail};
pub use path::{parse_path, Annotation, IndexValue, Part, Path};
pub use resolve::resolve;
