// The commit value shape and the BFS descend search `commit()` uses to
// decide whether a proposed write is a legitimate fast-forward from the
// dataset's current head.

use std::collections::HashSet;

use noms_base::{kind_err, Hash, Kind, Result};
use noms_tree::ValueReader;
use noms_types::{Ref, SequenceBody, Struct, Type, Value};

pub fn commit_type() -> Type {
    noms_types::make_struct_type(
        "Commit",
        vec![
            ("meta".to_string(), noms_types::value_type()),
            ("parents".to_string(), noms_types::make_set_type(noms_types::make_ref_type(Type::cycle(0)))),
            ("value".to_string(), noms_types::value_type()),
        ],
    )
    .expect("commit type is well-formed")
}

/// Build the `Commit { meta, parents, value }` struct value. `parents` is
/// expected to stay small enough to collapse into a single leaf — a
/// parent set that spans multiple chunks would need its non-root chunks
/// persisted separately before this value is embedded anywhere, which
/// this helper doesn't do.
pub fn build_commit_value(meta: Value, mut parents: Vec<Ref>, value: Value) -> Result<Value> {
    parents.sort();
    parents.dedup_by(|a, b| a.target_hash == b.target_hash);
    let parent_values: Vec<Value> = parents.into_iter().map(Value::Ref).collect();
    let tree = noms_tree::build_set(
        parent_values,
        noms_chunker::DEFAULT_PATTERN,
        noms_types::make_ref_type(Type::cycle(0)),
    )?;
    let s = Struct::new(commit_type(), vec![meta, tree.root, value])?;
    Ok(Value::Struct(s))
}

fn extract_parent_refs(commit: &Value) -> Result<Vec<Ref>> {
    let Value::Struct(s) = commit else {
        return Err(kind_err(Kind::Integrity, "expected a commit struct"));
    };
    let Some(Value::Set(seq)) = s.get("parents") else {
        return Err(kind_err(Kind::Integrity, "commit is missing its parents set"));
    };
    match seq.body() {
        SequenceBody::Items(items) => items
            .iter()
            .map(|v| match v {
                Value::Ref(r) => Ok(r.clone()),
                _ => Err(kind_err(Kind::Integrity, "parents set contains a non-ref member")),
            })
            .collect(),
        _ => Err(kind_err(Kind::Integrity, "chunked parents set is not supported by the descend search")),
    }
}

/// Starting from `parents`, expand one generation at a time (the union of
/// each frontier ref's own parents) until `head` is found or the frontier
/// runs dry.
pub fn descends_from(reader: &dyn ValueReader, parents: &[Ref], head: &Ref) -> Result<bool> {
    let mut frontier: Vec<Ref> = parents.to_vec();
    let mut visited: HashSet<Hash> = HashSet::new();
    loop {
        if frontier.iter().any(|r| r.target_hash == head.target_hash) {
            return Ok(true);
        }
        if frontier.is_empty() {
            return Ok(false);
        }
        let mut next = Vec::new();
        for r in frontier {
            if !visited.insert(r.target_hash) {
                continue;
            }
            let commit = reader.read_value(&r.target_hash)?;
            next.extend(extract_parent_refs(&commit)?);
        }
        frontier = next;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn commit_type_has_the_three_expected_fields() {
        let ty = commit_type();
        assert!(noms_types::looks_like_commit_type(&ty));
    }

    #[test]
    fn empty_parent_set_never_descends_from_a_real_head() {
        struct NeverReads;
        impl ValueReader for NeverReads {
            fn read_value(&self, _hash: &Hash) -> Result<Value> {
                panic!("should not be called when the frontier is already empty")
            }
        }
        let head = Ref::new(Hash::of_bytes(b"head"), 0, noms_types::value_type());
        assert!(!descends_from(&NeverReads, &[], &head).unwrap());
    }
}
