// Materializing an entire (possibly fetched-from-elsewhere) sequence into
// a flat in-memory `Vec`. Splice and diff both work on the flattened form
// rather than walking the tree incrementally: simpler to get right, at
// the cost of pulling every leaf into memory for the collections they
// touch.

use noms_base::{kind_err, Kind, Result};
use noms_types::{Sequence, SequenceBody, Value};

use crate::reader::ValueReader;

fn child(reader: &dyn ValueReader, hash: &noms_base::Hash) -> Result<Value> {
    reader.read_value(hash)
}

pub fn flatten_list(reader: &dyn ValueReader, v: &Value) -> Result<Vec<Value>> {
    let Value::List(seq) = v else { return Err(kind_err(Kind::Type, "not a list")) };
    let mut out = Vec::with_capacity(seq.len() as usize);
    flatten_items(reader, seq.as_ref(), &mut out)?;
    Ok(out)
}

pub fn flatten_set(reader: &dyn ValueReader, v: &Value) -> Result<Vec<Value>> {
    let Value::Set(seq) = v else { return Err(kind_err(Kind::Type, "not a set")) };
    let mut out = Vec::with_capacity(seq.len() as usize);
    flatten_items(reader, seq.as_ref(), &mut out)?;
    Ok(out)
}

fn flatten_items(reader: &dyn ValueReader, seq: &dyn Sequence, out: &mut Vec<Value>) -> Result<()> {
    if !seq.is_meta() {
        let SequenceBody::Items(items) = seq.body() else {
            return Err(kind_err(Kind::Integrity, "expected item leaf body"));
        };
        out.extend(items.iter().cloned());
        return Ok(());
    }
    let SequenceBody::Meta(tuples) = seq.body() else {
        return Err(kind_err(Kind::Integrity, "expected meta body"));
    };
    for t in tuples {
        let cv = child(reader, &t.r#ref.target_hash)?;
        let child_seq = match &cv {
            Value::List(s) | Value::Set(s) => s.as_ref(),
            _ => return Err(kind_err(Kind::Integrity, "expected list/set child")),
        };
        flatten_items(reader, child_seq, out)?;
    }
    Ok(())
}

pub fn flatten_map(reader: &dyn ValueReader, v: &Value) -> Result<Vec<(Value, Value)>> {
    let Value::Map(seq) = v else { return Err(kind_err(Kind::Type, "not a map")) };
    let mut out = Vec::with_capacity(seq.len() as usize);
    flatten_entries(reader, seq.as_ref(), &mut out)?;
    Ok(out)
}

fn flatten_entries(reader: &dyn ValueReader, seq: &dyn Sequence, out: &mut Vec<(Value, Value)>) -> Result<()> {
    if !seq.is_meta() {
        let SequenceBody::Entries(entries) = seq.body() else {
            return Err(kind_err(Kind::Integrity, "expected entry leaf body"));
        };
        out.extend(entries.iter().cloned());
        return Ok(());
    }
    let SequenceBody::Meta(tuples) = seq.body() else {
        return Err(kind_err(Kind::Integrity, "expected meta body"));
    };
    for t in tuples {
        let cv = child(reader, &t.r#ref.target_hash)?;
        let Value::Map(child_seq) = &cv else {
            return Err(kind_err(Kind::Integrity, "expected map child"));
        };
        flatten_entries(reader, child_seq.as_ref(), out)?;
    }
    Ok(())
}

pub fn flatten_blob(reader: &dyn ValueReader, v: &Value) -> Result<Vec<u8>> {
    let Value::Blob(seq) = v else { return Err(kind_err(Kind::Type, "not a blob")) };
    let mut out = Vec::with_capacity(seq.len() as usize);
    flatten_bytes(reader, seq.as_ref(), &mut out)?;
    Ok(out)
}

fn flatten_bytes(reader: &dyn ValueReader, seq: &dyn Sequence, out: &mut Vec<u8>) -> Result<()> {
    if !seq.is_meta() {
        let SequenceBody::Bytes(bytes) = seq.body() else {
            return Err(kind_err(Kind::Integrity, "expected byte leaf body"));
        };
        out.extend_from_slice(bytes);
        return Ok(());
    }
    let SequenceBody::Meta(tuples) = seq.body() else {
        return Err(kind_err(Kind::Integrity, "expected meta body"));
    };
    for t in tuples {
        let cv = child(reader, &t.r#ref.target_hash)?;
        let Value::Blob(child_seq) = &cv else {
            return Err(kind_err(Kind::Integrity, "expected blob child"));
        };
        flatten_bytes(reader, child_seq.as_ref(), out)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::build::build_list;
    use crate::reader::MapReader;
    use noms_chunker::TEST_PATTERN;
    use noms_types::Number;
    use test_log::test;

    #[test]
    fn flatten_recovers_original_order() {
        let items: Vec<Value> = (0..50).map(|i| Value::Number(Number::from_i64(i))).collect();
        let tree = build_list(items.clone(), TEST_PATTERN, noms_types::number_type()).unwrap();
        let reader = MapReader::from_chunks(&tree.chunks).unwrap();
        let flat = flatten_list(&reader, &tree.root).unwrap();
        let flat_nums: Vec<i64> = flat.iter().map(|v| v.as_number().unwrap().integer).collect();
        let expect: Vec<i64> = items.iter().map(|v| v.as_number().unwrap().integer).collect();
        assert_eq!(flat_nums, expect);
    }
}
