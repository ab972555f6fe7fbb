// `Database`: a `ValueStore` plus a `RootStore`, tying them together into
// the datasets map at the root and the CAS commit loop.

use std::collections::HashMap;
use std::sync::Arc;

use noms_base::{kind_err, Hash, Kind, Result};
use noms_codec::Chunk;
use noms_store::{ChunkStore, LruValueCache, ValueCache, ValueStore};
use noms_tree::{BuiltTree, ValueReader};
use noms_types::{Ref, Struct, Value};

use crate::commit::{build_commit_value, descends_from};

/// Bridges `noms_net`'s batch-oriented transport into the single-item
/// `ChunkStore` a `ValueStore` talks to. Each get/put becomes a
/// one-element batch call.
pub struct TransportChunkStore {
    transport: Arc<dyn noms_net::ChunkStoreTransport>,
}

impl TransportChunkStore {
    pub fn new(transport: Arc<dyn noms_net::ChunkStoreTransport>) -> Self {
        TransportChunkStore { transport }
    }
}

impl ChunkStore for TransportChunkStore {
    fn get(&self, hash: &Hash) -> Result<Chunk> {
        let mut chunks = self.transport.get_batch(std::slice::from_ref(hash))?;
        Ok(chunks.pop().unwrap_or_else(Chunk::empty))
    }

    fn put(&self, chunk: Chunk, hints: Vec<Hash>) -> Result<()> {
        self.transport.put_batch(vec![chunk], hints)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct CommitOptions {
    pub meta: Option<Value>,
    pub parents: Option<Vec<Ref>>,
}

fn empty_meta() -> Value {
    Value::Struct(Struct::new(noms_types::make_struct_type("Meta", vec![]).unwrap(), vec![]).unwrap())
}

pub struct Database {
    store: ValueStore,
    root_store: Arc<dyn noms_net::RootStore>,
}

impl Database {
    pub fn new(
        transport: Arc<dyn noms_net::ChunkStoreTransport>,
        root_store: Arc<dyn noms_net::RootStore>,
        value_cache: Arc<dyn ValueCache>,
    ) -> Self {
        let backing: Arc<dyn ChunkStore> = Arc::new(TransportChunkStore::new(transport));
        Database { store: ValueStore::new(backing, value_cache), root_store }
    }

    /// The `mem` dataset-spec backend: one `MemTransport` plays both the
    /// chunk-store transport and the root store.
    pub fn in_memory() -> Self {
        let mem = Arc::new(noms_net::MemTransport::new());
        let transport: Arc<dyn noms_net::ChunkStoreTransport> = mem.clone();
        let root_store: Arc<dyn noms_net::RootStore> = mem;
        Database::new(transport, root_store, Arc::new(LruValueCache::new(64 * 1024 * 1024)))
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn head(&self, dataset_id: &str) -> Result<Option<Ref>> {
        let root_hash = self.root_store.root()?;
        Ok(self.read_datasets_map(root_hash)?.remove(dataset_id))
    }

    fn read_datasets_map(&self, root_hash: Hash) -> Result<HashMap<String, Ref>> {
        if root_hash == Hash::EMPTY {
            return Ok(HashMap::new());
        }
        let Some(map) = self.store.read_value(&root_hash)? else {
            return Ok(HashMap::new());
        };
        let entries = noms_tree::flatten_map(&self.store, &map)?;
        let mut out = HashMap::with_capacity(entries.len());
        for (k, v) in entries {
            let name = k.as_str().ok_or_else(|| kind_err(Kind::Integrity, "datasets map key is not a string"))?;
            let Value::Ref(r) = v else {
                return Err(kind_err(Kind::Integrity, "datasets map value is not a ref"));
            };
            out.insert(name.to_string(), r);
        }
        Ok(out)
    }

    fn build_datasets_map_tree(&self, datasets: &HashMap<String, Ref>) -> Result<BuiltTree> {
        let mut entries: Vec<(Value, Value)> =
            datasets.iter().map(|(name, r)| (Value::String(name.clone()), Value::Ref(r.clone()))).collect();
        entries.sort_by(|(ak, _), (bk, _)| noms_tree::ordering_key(ak).unwrap().cmp(&noms_tree::ordering_key(bk).unwrap()));
        noms_tree::build_map(
            entries,
            noms_chunker::DEFAULT_PATTERN,
            noms_types::string_type(),
            noms_types::make_ref_type(crate::commit::commit_type()),
        )
    }

    /// Chunks in a `BuiltTree` are already ordered children-first, so
    /// writing each decoded chunk through `ValueStore::write_value` in
    /// order satisfies the store's "children must already be present"
    /// rule for free. The last chunk written is always the tree's root.
    fn persist_built_tree(&self, tree: &BuiltTree) -> Result<Ref> {
        let mut last = None;
        for chunk in &tree.chunks {
            let value = noms_codec::decode(chunk)?;
            last = Some(self.store.write_value(&value)?);
        }
        last.ok_or_else(|| kind_err(Kind::Integrity, "built tree produced no chunks"))
    }

    /// Commit `value` to `dataset_id`, retrying the root CAS as needed.
    /// Fails with `Kind::MergeNeeded` if `options.parents` (or, absent
    /// that, the dataset's current head) isn't an ancestor of — or isn't
    /// — the dataset's actual current head by the time the CAS lands.
    pub fn commit(&self, dataset_id: &str, value: Value, options: CommitOptions) -> Result<Ref> {
        loop {
            let root_hash = self.root_store.root()?;
            let datasets = self.read_datasets_map(root_hash)?;
            let current_head = datasets.get(dataset_id).cloned();

            let parents = match &options.parents {
                Some(p) => p.clone(),
                None => current_head.iter().cloned().collect(),
            };

            if let Some(head_ref) = &current_head {
                let is_fast_forward = parents.iter().any(|p| p.target_hash == head_ref.target_hash)
                    || descends_from(&self.store, &parents, head_ref)?;
                if !is_fast_forward {
                    return Err(kind_err(Kind::MergeNeeded, "commit does not descend from the dataset's current head"));
                }
            }

            let meta = options.meta.clone().unwrap_or_else(empty_meta);
            let commit_value = build_commit_value(meta, parents.clone(), value.clone())?;
            let commit_ref = self.store.write_value(&commit_value)?;

            let mut new_datasets = datasets;
            new_datasets.insert(dataset_id.to_string(), commit_ref.clone());
            let map_tree = self.build_datasets_map_tree(&new_datasets)?;
            let map_ref = self.persist_built_tree(&map_tree)?;
            self.store.flush()?;

            if self.root_store.update_root(map_ref.target_hash, root_hash)? {
                return Ok(commit_ref);
            }
            tracing::debug!(dataset_id, "commit CAS conflict, retrying");
        }
    }
}
