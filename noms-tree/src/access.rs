// Point lookups into a (possibly lazily-fetched) prolly tree: descend
// indexed sequences by cumulative leaf count, ordered ones by binary
// search over each meta tuple's key.

use noms_base::{kind_err, Hash, Kind, Result};
use noms_types::{OrderedKey, Sequence, SequenceBody, Value};

use crate::reader::{ordering_key, ValueReader};

fn child_value(reader: &dyn ValueReader, seq: &dyn Sequence, idx: usize) -> Result<Value> {
    let SequenceBody::Meta(tuples) = seq.body() else {
        return Err(kind_err(Kind::Integrity, "expected meta body"));
    };
    reader.read_value(&tuples[idx].r#ref.target_hash)
}

fn sequence_of(v: &Value) -> Result<&dyn Sequence> {
    match v {
        Value::List(s) | Value::Set(s) | Value::Map(s) | Value::Blob(s) => Ok(s.as_ref()),
        _ => Err(kind_err(Kind::Type, "value is not a collection")),
    }
}

/// Resolve a negative-capable list/blob index into an in-bounds `u64`, or
/// `None` if it falls outside `[0, len)`.
fn resolve_index(len: u64, index: i64) -> Option<u64> {
    let idx = if index < 0 { len as i64 + index } else { index };
    if idx < 0 || idx as u64 >= len {
        None
    } else {
        Some(idx as u64)
    }
}

pub fn get_list_item(reader: &dyn ValueReader, v: &Value, index: i64) -> Result<Option<Value>> {
    let Value::List(seq) = v else { return Err(kind_err(Kind::Type, "not a list")) };
    let Some(idx) = resolve_index(seq.len(), index) else { return Ok(None) };
    get_indexed(reader, seq.as_ref(), idx)
}

pub fn get_blob_byte(reader: &dyn ValueReader, v: &Value, index: i64) -> Result<Option<u8>> {
    let Value::Blob(seq) = v else { return Err(kind_err(Kind::Type, "not a blob")) };
    let Some(idx) = resolve_index(seq.len(), index) else { return Ok(None) };
    match get_indexed_bytes(reader, seq.as_ref(), idx)? {
        Some(b) => Ok(Some(b)),
        None => Ok(None),
    }
}

fn get_indexed(reader: &dyn ValueReader, seq: &dyn Sequence, idx: u64) -> Result<Option<Value>> {
    if !seq.is_meta() {
        let SequenceBody::Items(items) = seq.body() else {
            return Err(kind_err(Kind::Integrity, "expected item leaf body"));
        };
        return Ok(items.get(idx as usize).cloned());
    }
    let SequenceBody::Meta(tuples) = seq.body() else {
        return Err(kind_err(Kind::Integrity, "expected meta body"));
    };
    let mut offset = 0u64;
    for t in tuples {
        if idx < offset + t.num_leaves {
            let child = reader.read_value(&t.r#ref.target_hash)?;
            let child_seq = sequence_of(&child)?;
            return get_indexed(reader, child_seq, idx - offset);
        }
        offset += t.num_leaves;
    }
    Ok(None)
}

fn get_indexed_bytes(reader: &dyn ValueReader, seq: &dyn Sequence, idx: u64) -> Result<Option<u8>> {
    if !seq.is_meta() {
        let SequenceBody::Bytes(bytes) = seq.body() else {
            return Err(kind_err(Kind::Integrity, "expected byte leaf body"));
        };
        return Ok(bytes.get(idx as usize).copied());
    }
    let SequenceBody::Meta(tuples) = seq.body() else {
        return Err(kind_err(Kind::Integrity, "expected meta body"));
    };
    let mut offset = 0u64;
    for t in tuples {
        if idx < offset + t.num_leaves {
            let child = reader.read_value(&t.r#ref.target_hash)?;
            let child_seq = sequence_of(&child)?;
            return get_indexed_bytes(reader, child_seq, idx - offset);
        }
        offset += t.num_leaves;
    }
    Ok(None)
}

pub fn get_map_entry(reader: &dyn ValueReader, v: &Value, key: &Value) -> Result<Option<(Value, Value)>> {
    let Value::Map(seq) = v else { return Err(kind_err(Kind::Type, "not a map")) };
    get_map_entry_for_key(reader, seq.as_ref(), &ordering_key(key)?)
}

/// `[#h]` on a map: binary-search cursor to the entry whose key hashes to
/// `hash`. Only ever finds something when the key type is non-primitive
/// (primitive keys order by value, not by hash of their encoding).
pub fn get_map_entry_by_hash(reader: &dyn ValueReader, v: &Value, hash: Hash) -> Result<Option<(Value, Value)>> {
    let Value::Map(seq) = v else { return Err(kind_err(Kind::Type, "not a map")) };
    get_map_entry_for_key(reader, seq.as_ref(), &OrderedKey::Hash(hash))
}

fn get_map_entry_for_key(
    reader: &dyn ValueReader,
    seq: &dyn Sequence,
    target: &OrderedKey,
) -> Result<Option<(Value, Value)>> {
    get_ordered(reader, seq, target, |body| match body {
        SequenceBody::Entries(entries) => entries
            .iter()
            .find_map(|(k, val)| (ordering_key(k).ok().as_ref() == Some(target)).then(|| (k.clone(), val.clone())))
            .map(Ok)
            .transpose(),
        _ => Err(kind_err(Kind::Integrity, "expected entry leaf body")),
    })
}

pub fn get_set_member(reader: &dyn ValueReader, v: &Value, key: &Value) -> Result<Option<Value>> {
    let Value::Set(seq) = v else { return Err(kind_err(Kind::Type, "not a set")) };
    get_set_member_for_key(reader, seq.as_ref(), &ordering_key(key)?)
}

/// `[#h]` on a set: binary-search cursor to the member whose hash equals
/// `hash`.
pub fn get_set_member_by_hash(reader: &dyn ValueReader, v: &Value, hash: Hash) -> Result<Option<Value>> {
    let Value::Set(seq) = v else { return Err(kind_err(Kind::Type, "not a set")) };
    get_set_member_for_key(reader, seq.as_ref(), &OrderedKey::Hash(hash))
}

fn get_set_member_for_key(reader: &dyn ValueReader, seq: &dyn Sequence, target: &OrderedKey) -> Result<Option<Value>> {
    get_ordered(reader, seq, target, |body| match body {
        SequenceBody::Items(items) => items
            .iter()
            .find_map(|item| (ordering_key(item).ok().as_ref() == Some(target)).then(|| item.clone()))
            .map(Ok)
            .transpose(),
        _ => Err(kind_err(Kind::Integrity, "expected item leaf body")),
    })
}

fn get_ordered<R>(
    reader: &dyn ValueReader,
    seq: &dyn Sequence,
    target: &noms_types::OrderedKey,
    at_leaf: impl Fn(SequenceBody<'_>) -> Result<Option<R>> + Copy,
) -> Result<Option<R>> {
    if !seq.is_meta() {
        return at_leaf(seq.body());
    }
    let SequenceBody::Meta(tuples) = seq.body() else {
        return Err(kind_err(Kind::Integrity, "expected meta body"));
    };
    // Each tuple's key is the largest key in its subtree; the first tuple
    // whose key is >= target is the only subtree that could hold it.
    let found = tuples.iter().find(|t| &t.key >= target);
    let Some(t) = found else { return Ok(None) };
    let child = reader.read_value(&t.r#ref.target_hash)?;
    let child_seq = sequence_of(&child)?;
    get_ordered(reader, child_seq, target, at_leaf)
}
