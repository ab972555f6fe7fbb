// Walks a parsed `Path` over a starting `Value`, returning `None` the
// moment resolution hits something the grammar calls out as "-> null"
// (missing field, out-of-range index, absent key) rather than treating
// any of those as an error — only a malformed path is an error, which
// the parser has already rejected by the time this runs.

use noms_base::Result;
use noms_types::Value;

use crate::path::{Annotation, IndexValue, Part, Path};

pub fn resolve(reader: &dyn noms_tree::ValueReader, root: &Value, path: &Path) -> Result<Option<Value>> {
    let mut current = Some(root.clone());
    for part in &path.0 {
        let Some(v) = current else { return Ok(None) };
        current = resolve_part(reader, &v, part)?;
    }
    Ok(current)
}

fn resolve_part(reader: &dyn noms_tree::ValueReader, v: &Value, part: &Part) -> Result<Option<Value>> {
    match part {
        Part::Field(name) => Ok(match v {
            Value::Struct(s) => s.get(name).cloned(),
            _ => None,
        }),
        Part::Bare(Annotation::Type) => Ok(Some(Value::Type(v.value_type()))),
        Part::Bare(_) => Ok(None),
        Part::Index(idx, anno) => resolve_index(reader, v, idx, *anno),
    }
}

fn resolve_index(
    reader: &dyn noms_tree::ValueReader,
    v: &Value,
    idx: &IndexValue,
    anno: Option<Annotation>,
) -> Result<Option<Value>> {
    match v {
        Value::List(_) => {
            let i = match idx {
                IndexValue::Number(n) => n.as_f64() as i64,
                _ => return Ok(None),
            };
            match anno {
                Some(Annotation::At(n)) => noms_tree::get_list_item(reader, v, n),
                _ => noms_tree::get_list_item(reader, v, i),
            }
        }
        Value::Map(_) => {
            let entry = match idx {
                IndexValue::Hash(h) => noms_tree::get_map_entry_by_hash(reader, v, *h)?,
                _ => match index_as_value(idx) {
                    Some(key) => noms_tree::get_map_entry(reader, v, &key)?,
                    None => None,
                },
            };
            match anno {
                Some(Annotation::Key) => Ok(entry.map(|(k, _)| k)),
                _ => Ok(entry.map(|(_, val)| val)),
            }
        }
        Value::Set(_) => match idx {
            IndexValue::Hash(h) => noms_tree::get_set_member_by_hash(reader, v, *h),
            _ => match index_as_value(idx) {
                Some(key) => noms_tree::get_set_member(reader, v, &key),
                None => Ok(None),
            },
        },
        Value::Blob(_) => {
            let i = match idx {
                IndexValue::Number(n) => n.as_f64() as i64,
                _ => return Ok(None),
            };
            Ok(noms_tree::get_blob_byte(reader, v, i)?.map(|b| Value::Number(noms_types::Number::from_i64(b as i64))))
        }
        _ => Ok(None),
    }
}

fn index_as_value(idx: &IndexValue) -> Option<Value> {
    match idx {
        IndexValue::Str(s) => Some(Value::String(s.clone())),
        IndexValue::Bool(b) => Some(Value::Bool(*b)),
        IndexValue::Number(n) => Some(Value::Number(*n)),
        // Callers handle `[#h]` themselves via `get_map_entry_by_hash`/
        // `get_set_member_by_hash` before falling back to this helper, since
        // a hash index searches by `OrderedKey::Hash` directly rather than
        // by a concrete `Value` this function could produce.
        IndexValue::Hash(_) => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::parse_path;
    use noms_base::Hash;
    use noms_tree::NoReader;
    use noms_types::{make_struct_type, Number, Struct};
    use test_log::test;

    fn scenario_struct() -> Value {
        let ty = make_struct_type(
            "P",
            vec![
                ("bar".to_string(), noms_types::bool_type()),
                ("baz".to_string(), noms_types::number_type()),
                ("foo".to_string(), noms_types::string_type()),
            ],
        )
        .unwrap();
        Value::Struct(
            Struct::new(
                ty,
                vec![Value::Bool(false), Value::Number(Number::from_i64(203)), Value::String("foo".to_string())],
            )
            .unwrap(),
        )
    }

    #[test]
    fn s2_struct_field_resolution() {
        let v = scenario_struct();
        let reader = NoReader;
        let foo = resolve(&reader, &v, &parse_path(".foo").unwrap()).unwrap();
        assert_eq!(foo.unwrap().as_str().unwrap(), "foo");
        let missing = resolve(&reader, &v, &parse_path(".notHere").unwrap()).unwrap();
        assert!(missing.is_none());
    }

    fn tagged_struct(n: i64) -> Value {
        let ty = make_struct_type("Tag", vec![("n".to_string(), noms_types::number_type())]).unwrap();
        Value::Struct(Struct::new(ty, vec![Value::Number(Number::from_i64(n))]).unwrap())
    }

    #[test]
    fn hash_index_finds_the_set_member_with_that_encoding_hash() {
        // Struct members order (and thus binary-search) by the hash of
        // their own encoding, not by field value, so sort by that key
        // before building the set — same requirement `build_set` documents.
        let mut members = vec![tagged_struct(1), tagged_struct(2), tagged_struct(3)];
        members.sort_by_key(|v| noms_tree::ordering_key(v).unwrap());
        let target_hash = noms_codec::encode(&members[1]).unwrap().hash();
        let ty = make_struct_type("Tag", vec![("n".to_string(), noms_types::number_type())]).unwrap();
        let tree = noms_tree::build_set(members.clone(), noms_chunker::TEST_PATTERN, ty).unwrap();
        let reader = NoReader;

        let path = parse_path(&format!("[#{target_hash}]")).unwrap();
        let found = resolve(&reader, &tree.root, &path).unwrap();
        assert!(noms_tree::value_eq(&found.unwrap(), &members[1]).unwrap());

        let unknown = parse_path(&format!("[#{}]", Hash::of_bytes(b"nope"))).unwrap();
        assert!(resolve(&reader, &tree.root, &unknown).unwrap().is_none());
    }

    #[test]
    fn s2_list_index_resolution() {
        let items = vec![
            Value::Number(Number::from_i64(1)),
            Value::Number(Number::from_i64(3)),
            Value::String("foo".to_string()),
            Value::Bool(false),
        ];
        let tree = noms_tree::build_list(items, noms_chunker::TEST_PATTERN, noms_types::value_type()).unwrap();
        let reader = NoReader;

        let at2 = resolve(&reader, &tree.root, &parse_path("[2]").unwrap()).unwrap();
        assert_eq!(at2.unwrap().as_str().unwrap(), "foo");

        let at_neg1 = resolve(&reader, &tree.root, &parse_path("[-1]").unwrap()).unwrap();
        assert_eq!(at_neg1.unwrap().as_bool(), Some(false));

        let at4 = resolve(&reader, &tree.root, &parse_path("[4]").unwrap()).unwrap();
        assert!(at4.is_none());
    }
}
