// `chunkSequence`: edit a collection by flattening, mutating the flat
// form, and re-chunking. The rolling hasher is deterministic on the item
// byte stream, so re-chunking an unchanged prefix/suffix reproduces the
// same leaf boundaries that were already there — splicing zero items
// into the middle of a sequence is therefore a no-op on the root hash,
// even though this implementation pays for a full re-chunk to get there.

use noms_base::{kind_err, Kind, Result};
use noms_types::{Type, Value};

use crate::build::{build_blob, build_list, build_map, build_set, BuiltTree};
use crate::flatten::{flatten_blob, flatten_list, flatten_map, flatten_set};
use crate::reader::{ordering_key, ValueReader};

/// Replace `remove` items starting at index `at` with `insert`, leaving
/// everything outside that range untouched.
pub fn splice_list(
    reader: &dyn ValueReader,
    v: &Value,
    at: u64,
    remove: u64,
    insert: Vec<Value>,
    elem_type: Type,
    pattern: u64,
) -> Result<BuiltTree> {
    let mut items = flatten_list(reader, v)?;
    splice_vec(&mut items, at, remove, insert)?;
    build_list(items, pattern, elem_type)
}

pub fn splice_blob(
    reader: &dyn ValueReader,
    v: &Value,
    at: u64,
    remove: u64,
    insert: Vec<u8>,
    pattern: u64,
) -> Result<BuiltTree> {
    let mut bytes = flatten_blob(reader, v)?;
    let at = at as usize;
    let remove = remove as usize;
    if at > bytes.len() || at + remove > bytes.len() {
        return Err(kind_err(Kind::Integrity, "splice range out of bounds"));
    }
    bytes.splice(at..at + remove, insert);
    build_blob(bytes, pattern)
}

fn splice_vec(items: &mut Vec<Value>, at: u64, remove: u64, insert: Vec<Value>) -> Result<()> {
    let at = at as usize;
    let remove = remove as usize;
    if at > items.len() || at + remove > items.len() {
        return Err(kind_err(Kind::Integrity, "splice range out of bounds"));
    }
    items.splice(at..at + remove, insert);
    Ok(())
}

/// Insert/remove entries by key, re-sorting and de-duplicating by
/// `ordering_key` before rebuilding — map entries must stay key-ordered.
pub fn edit_map(
    reader: &dyn ValueReader,
    v: &Value,
    removals: &[Value],
    insertions: Vec<(Value, Value)>,
    key_type: Type,
    value_type_elem: Type,
    pattern: u64,
) -> Result<BuiltTree> {
    let mut entries = flatten_map(reader, v)?;
    for key in removals {
        let target = ordering_key(key)?;
        entries.retain(|(k, _)| ordering_key(k).map(|ok| ok != target).unwrap_or(true));
    }
    for (k, val) in insertions {
        let target = ordering_key(&k)?;
        entries.retain(|(ek, _)| ordering_key(ek).map(|ok| ok != target).unwrap_or(true));
        entries.push((k, val));
    }
    sort_dedup_by_key(&mut entries, |(k, _)| ordering_key(k))?;
    build_map(entries, pattern, key_type, value_type_elem)
}

pub fn edit_set(
    reader: &dyn ValueReader,
    v: &Value,
    removals: &[Value],
    insertions: Vec<Value>,
    elem_type: Type,
    pattern: u64,
) -> Result<BuiltTree> {
    let mut items = flatten_set(reader, v)?;
    for key in removals {
        let target = ordering_key(key)?;
        items.retain(|item| ordering_key(item).map(|ok| ok != target).unwrap_or(true));
    }
    for item in insertions {
        let target = ordering_key(&item)?;
        items.retain(|existing| ordering_key(existing).map(|ok| ok != target).unwrap_or(true));
        items.push(item);
    }
    sort_dedup_by_key(&mut items, ordering_key)?;
    build_set(items, pattern, elem_type)
}

fn sort_dedup_by_key<T>(
    items: &mut Vec<T>,
    key_of: impl Fn(&T) -> Result<noms_types::OrderedKey>,
) -> Result<()> {
    let mut keyed: Vec<(noms_types::OrderedKey, T)> =
        items.drain(..).map(|item| key_of(&item).map(|k| (k, item))).collect::<Result<_>>()?;
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|a, b| a.0 == b.0);
    *items = keyed.into_iter().map(|(_, v)| v).collect();
    Ok(())
}
