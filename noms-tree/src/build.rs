// Turns a flat run of items into a chunked prolly tree: level 0 is built
// by feeding each item's encoded bytes through a `Chunker`, closing a leaf
// at every content-defined boundary; level 1 does the same over the
// level-0 leaves' `MetaTuple`s (keyed by hash bytes, since a meta tuple's
// own encoding isn't needed just to decide where it splits); and so on
// until a single node remains. That node, plus every chunk produced along
// the way (the caller persists them; this crate only builds the shape),
// is the result.

use std::sync::Arc;

use noms_base::{Hash, Result};
use noms_codec::{Chunk, DecodedBody, DecodedSequence};
use noms_chunker::Chunker;
use noms_types::{MetaTuple, OrderedKey, Ref, Sequence, Type, Value, ValueKind};
use tracing::trace;

use crate::reader::ordering_key;

pub struct BuiltTree {
    pub root: Value,
    pub chunks: Vec<Chunk>,
}

struct LevelItem {
    value: Value,
    hash: Hash,
    key: OrderedKey,
    num_leaves: u64,
}

fn close_leaf<T>(
    pending: Vec<T>,
    kind: ValueKind,
    value_type: &Type,
    wrap: &impl Fn(Arc<dyn Sequence>) -> Value,
    leaf_body: &impl Fn(Vec<T>) -> DecodedBody,
    key_of_last: &impl Fn(&T) -> Result<OrderedKey>,
) -> Result<(LevelItem, Chunk)> {
    let key = key_of_last(pending.last().expect("leaf is never closed empty"))?;
    let num_leaves = pending.len() as u64;
    let seq = DecodedSequence::new(kind, value_type.clone(), false, leaf_body(pending));
    let value = wrap(Arc::new(seq));
    let chunk = noms_codec::encode(&value)?;
    Ok((LevelItem { value: value.clone(), hash: chunk.hash(), key, num_leaves }, chunk))
}

/// Build a chunked tree from `items`. `encode_item` supplies the bytes fed
/// to the rolling hash for each item (the item's own wire encoding, for
/// `List`/`Set`/`Map`; raw bytes for `Blob`). `key_of` gives the ordering
/// key recorded for the last item of a leaf, for use as that leaf's meta
/// tuple key.
#[allow(clippy::too_many_arguments)]
pub fn build_sequence<T>(
    items: Vec<T>,
    pattern: u64,
    kind: ValueKind,
    value_type: Type,
    encode_item: impl Fn(&T) -> Result<Vec<u8>>,
    key_of: impl Fn(&T) -> Result<OrderedKey>,
    leaf_body: impl Fn(Vec<T>) -> DecodedBody,
    wrap: impl Fn(Arc<dyn Sequence>) -> Value,
) -> Result<BuiltTree> {
    let mut chunks = Vec::new();

    if items.is_empty() {
        let seq = DecodedSequence::new(kind, value_type.clone(), false, leaf_body(Vec::new()));
        let root = wrap(Arc::new(seq));
        let chunk = noms_codec::encode(&root)?;
        chunks.push(chunk);
        return Ok(BuiltTree { root, chunks });
    }

    let mut chunker: Chunker<T> = Chunker::new(pattern);
    let mut level: Vec<LevelItem> = Vec::new();
    for item in items {
        let bytes = encode_item(&item)?;
        if chunker.append(item, &bytes) {
            let pending = chunker.take_closed();
            let (item, chunk) = close_leaf(pending, kind, &value_type, &wrap, &leaf_body, &key_of)?;
            level.push(item);
            chunks.push(chunk);
        }
    }
    let tail = chunker.finish();
    if !tail.is_empty() {
        let (item, chunk) = close_leaf(tail, kind, &value_type, &wrap, &leaf_body, &key_of)?;
        level.push(item);
        chunks.push(chunk);
    }

    let mut node_height: u64 = 1;
    while level.len() > 1 {
        let mut next_level: Vec<LevelItem> = Vec::new();
        let mut mchunker: Chunker<MetaTuple> = Chunker::new(pattern);

        for it in level {
            let tuple = MetaTuple {
                r#ref: Ref::new(it.hash, node_height, value_type.clone()),
                key: it.key,
                num_leaves: it.num_leaves,
            };
            let bytes = it.hash.as_bytes().to_vec();
            if mchunker.append(tuple, &bytes) {
                let tuples = mchunker.take_closed();
                let key = tuples.last().unwrap().key.clone();
                let num_leaves: u64 = tuples.iter().map(|t| t.num_leaves).sum();
                let seq = DecodedSequence::new(kind, value_type.clone(), true, DecodedBody::Meta(tuples));
                let value = wrap(Arc::new(seq));
                let chunk = noms_codec::encode(&value)?;
                next_level.push(LevelItem { value, hash: chunk.hash(), key, num_leaves });
                chunks.push(chunk);
            }
        }
        let tail = mchunker.finish();
        if !tail.is_empty() {
            let key = tail.last().unwrap().key.clone();
            let num_leaves: u64 = tail.iter().map(|t| t.num_leaves).sum();
            let seq = DecodedSequence::new(kind, value_type.clone(), true, DecodedBody::Meta(tail));
            let value = wrap(Arc::new(seq));
            let chunk = noms_codec::encode(&value)?;
            next_level.push(LevelItem { value, hash: chunk.hash(), key, num_leaves });
            chunks.push(chunk);
        }

        level = next_level;
        node_height += 1;
    }

    let root = level.into_iter().next().expect("non-empty items always leave one root").value;
    trace!(kind = ?kind, num_chunks = chunks.len(), "built sequence tree");
    Ok(BuiltTree { root, chunks })
}

pub fn build_list(items: Vec<Value>, pattern: u64, elem_type: Type) -> Result<BuiltTree> {
    let value_type = noms_types::make_list_type(elem_type);
    build_sequence(
        items,
        pattern,
        ValueKind::List,
        value_type,
        |v| Ok(noms_codec::encode(v)?.bytes().to_vec()),
        |v| ordering_key(v),
        DecodedBody::Items,
        Value::List,
    )
}

/// `items` must already be sorted and de-duplicated by `ordering_key`.
pub fn build_set(items: Vec<Value>, pattern: u64, elem_type: Type) -> Result<BuiltTree> {
    let value_type = noms_types::make_set_type(elem_type);
    build_sequence(
        items,
        pattern,
        ValueKind::Set,
        value_type,
        |v| Ok(noms_codec::encode(v)?.bytes().to_vec()),
        |v| ordering_key(v),
        DecodedBody::Items,
        Value::Set,
    )
}

/// `entries` must already be sorted and de-duplicated by the key's
/// `ordering_key`.
pub fn build_map(
    entries: Vec<(Value, Value)>,
    pattern: u64,
    key_type: Type,
    value_type_elem: Type,
) -> Result<BuiltTree> {
    let value_type = noms_types::make_map_type(key_type, value_type_elem);
    build_sequence(
        entries,
        pattern,
        ValueKind::Map,
        value_type,
        |(k, v)| {
            let mut bytes = noms_codec::encode(k)?.bytes().to_vec();
            bytes.extend_from_slice(noms_codec::encode(v)?.bytes());
            Ok(bytes)
        },
        |(k, _v)| ordering_key(k),
        DecodedBody::Entries,
        Value::Map,
    )
}

// Blob leaves have no natural per-item key the way List/Map items do, so
// their meta tuple key is just a running count of leaves closed so far:
// monotonically increasing, which is all an ordering key needs to be.
pub fn build_blob(bytes: Vec<u8>, pattern: u64) -> Result<BuiltTree> {
    let value_type = noms_types::blob_type();
    let leaf_counter = std::cell::Cell::new(0i64);
    build_sequence(
        bytes,
        pattern,
        ValueKind::Blob,
        value_type,
        |b| Ok(vec![*b]),
        move |_b| {
            leaf_counter.set(leaf_counter.get() + 1);
            Ok(OrderedKey::Primitive(noms_types::PrimitiveKey::Number(noms_types::Number::from_i64(
                leaf_counter.get(),
            ))))
        },
        DecodedBody::Bytes,
        Value::Blob,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use noms_chunker::TEST_PATTERN;
    use noms_types::Number;
    use test_log::test;

    #[test]
    fn build_list_is_deterministic() {
        let items: Vec<Value> = (0..500).map(|i| Value::Number(Number::from_i64(i))).collect();
        let a = build_list(items.clone(), TEST_PATTERN, noms_types::number_type()).unwrap();
        let b = build_list(items, TEST_PATTERN, noms_types::number_type()).unwrap();
        assert_eq!(noms_codec::encode(&a.root).unwrap().hash(), noms_codec::encode(&b.root).unwrap().hash());
    }

    #[test]
    fn small_list_collapses_to_a_single_leaf() {
        let items = vec![Value::Number(Number::from_i64(1)), Value::Number(Number::from_i64(2))];
        let tree = build_list(items, TEST_PATTERN, noms_types::number_type()).unwrap();
        match &tree.root {
            Value::List(seq) => assert!(!seq.is_meta()),
            _ => panic!("expected list"),
        }
        assert_eq!(tree.chunks.len(), 1);
    }

    #[test]
    fn large_list_produces_a_meta_sequence() {
        let items: Vec<Value> = (0..2000).map(|i| Value::Number(Number::from_i64(i))).collect();
        let tree = build_list(items, TEST_PATTERN, noms_types::number_type()).unwrap();
        match &tree.root {
            Value::List(seq) => assert!(seq.is_meta()),
            _ => panic!("expected list"),
        }
        assert!(tree.chunks.len() > 1);
        let chunk = noms_codec::encode(&tree.root).unwrap();
        let decoded = noms_codec::decode(&chunk).unwrap();
        assert_eq!(decoded.kind(), ValueKind::List);
    }

    #[test]
    fn empty_blob_is_a_single_empty_leaf() {
        let tree = build_blob(Vec::new(), TEST_PATTERN).unwrap();
        assert_eq!(tree.chunks.len(), 1);
        match &tree.root {
            Value::Blob(seq) => assert_eq!(seq.len(), 0),
            _ => panic!("expected blob"),
        }
    }
}
