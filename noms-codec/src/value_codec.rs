// Value body encoding. Every value, anywhere in the tree (struct field,
// collection item, map entry), is encoded fully self-describing: its
// `Type` first, then its body — so a `List<Union<Bool,Number>>` item
// carries enough information on its own to know which union arm it is,
// without the reader needing surrounding context.

use std::sync::Arc;

use noms_base::{kind_err, Kind as ErrKind, Result};
use noms_types::{
    looks_like_commit_type, MetaTuple, Number, OrderedKey, PrimitiveKey, Ref, Sequence,
    SequenceBody, Struct, Type, Value, ValueKind,
};

use crate::ioutil::{Reader, Writer};
use crate::sequence::{DecodedBody, DecodedSequence};
use crate::ty_codec::{decode_type, encode_type};

pub fn encode_value(w: &mut Writer, v: &Value) -> Result<()> {
    encode_type(w, &v.value_type())?;
    encode_value_body(w, v)
}

pub fn decode_value(r: &mut Reader) -> Result<Value> {
    let ty = decode_type(r)?;
    decode_value_body(r, &ty)
}

fn encode_value_body(w: &mut Writer, v: &Value) -> Result<()> {
    match v {
        Value::Bool(b) => w.write_bool(*b),
        Value::Number(n) => encode_number(w, n)?,
        Value::String(s) => w.write_str(s),
        Value::Type(t) => encode_type(w, t)?,
        Value::Ref(r) => {
            w.write_hash(&r.target_hash);
            w.write_uint64(r.height)?;
        }
        Value::Struct(s) => {
            for field in s.values() {
                encode_value(w, field)?;
            }
        }
        Value::Blob(seq) => encode_sequence(w, seq.as_ref(), encode_bytes_leaf)?,
        Value::List(seq) => encode_sequence(w, seq.as_ref(), encode_items_leaf)?,
        Value::Set(seq) => encode_sequence(w, seq.as_ref(), encode_items_leaf)?,
        Value::Map(seq) => encode_sequence(w, seq.as_ref(), encode_entries_leaf)?,
    }
    Ok(())
}

fn encode_number(w: &mut Writer, n: &Number) -> Result<()> {
    if !n.is_finite() {
        return Err(kind_err(ErrKind::Integrity, "non-finite Number"));
    }
    w.write_zigzag_varint(n.integer);
    w.write_zigzag_varint(n.exponent);
    Ok(())
}

fn encode_bytes_leaf(w: &mut Writer, body: &SequenceBody<'_>) -> Result<()> {
    match body {
        SequenceBody::Bytes(b) => {
            w.write_uint32(b.len() as u32);
            for byte in b.iter() {
                w.write_uint8(*byte);
            }
            Ok(())
        }
        _ => Err(kind_err(ErrKind::Integrity, "expected byte leaf body")),
    }
}

fn encode_items_leaf(w: &mut Writer, body: &SequenceBody<'_>) -> Result<()> {
    match body {
        SequenceBody::Items(items) => {
            w.write_uint32(items.len() as u32);
            for item in items.iter() {
                encode_value(w, item)?;
            }
            Ok(())
        }
        _ => Err(kind_err(ErrKind::Integrity, "expected item leaf body")),
    }
}

fn encode_entries_leaf(w: &mut Writer, body: &SequenceBody<'_>) -> Result<()> {
    match body {
        SequenceBody::Entries(entries) => {
            w.write_uint32(entries.len() as u32);
            for (k, val) in entries.iter() {
                encode_value(w, k)?;
                encode_value(w, val)?;
            }
            Ok(())
        }
        _ => Err(kind_err(ErrKind::Integrity, "expected entry leaf body")),
    }
}

fn encode_sequence(
    w: &mut Writer,
    seq: &dyn Sequence,
    encode_leaf: fn(&mut Writer, &SequenceBody<'_>) -> Result<()>,
) -> Result<()> {
    w.write_bool(seq.is_meta());
    if seq.is_meta() {
        let body = seq.body();
        match body {
            SequenceBody::Meta(tuples) => {
                w.write_uint32(tuples.len() as u32);
                for t in tuples {
                    encode_meta_tuple(w, t)?;
                }
                Ok(())
            }
            _ => Err(kind_err(ErrKind::Integrity, "expected meta body")),
        }
    } else {
        encode_leaf(w, &seq.body())
    }
}

fn encode_meta_tuple(w: &mut Writer, t: &MetaTuple) -> Result<()> {
    w.write_hash(&t.r#ref.target_hash);
    w.write_uint64(t.r#ref.height)?;
    encode_type(w, &t.r#ref.target_type)?;
    encode_ordered_key(w, &t.key)?;
    w.write_uint64(t.num_leaves)?;
    Ok(())
}

fn encode_ordered_key(w: &mut Writer, k: &OrderedKey) -> Result<()> {
    match k {
        OrderedKey::Primitive(PrimitiveKey::Bool(b)) => {
            w.write_uint8(0);
            w.write_bool(*b);
        }
        OrderedKey::Primitive(PrimitiveKey::Number(n)) => {
            w.write_uint8(1);
            encode_number(w, n)?;
        }
        OrderedKey::Primitive(PrimitiveKey::Str(s)) => {
            w.write_uint8(2);
            w.write_str(s);
        }
        // Encoded as a convenience `Ref<Bool>`-shaped pair: a hash plus
        // a height of 0. It is not a real reference to a stored chunk.
        OrderedKey::Hash(h) => {
            w.write_uint8(3);
            w.write_hash(h);
            w.write_uint64(0)?;
        }
    }
    Ok(())
}

fn decode_ordered_key(r: &mut Reader) -> Result<OrderedKey> {
    Ok(match r.read_uint8()? {
        0 => OrderedKey::Primitive(PrimitiveKey::Bool(r.read_bool()?)),
        1 => OrderedKey::Primitive(PrimitiveKey::Number(decode_number(r)?)),
        2 => OrderedKey::Primitive(PrimitiveKey::Str(r.read_str()?)),
        3 => {
            let h = r.read_hash()?;
            let _height_always_zero = r.read_uint64()?;
            OrderedKey::Hash(h)
        }
        other => {
            return Err(kind_err(ErrKind::Integrity, format!("invalid ordered key tag {other}")))
        }
    })
}

fn decode_number(r: &mut Reader) -> Result<Number> {
    let integer = r.read_zigzag_varint()?;
    let exponent = r.read_zigzag_varint()?;
    let n = Number::new(integer, exponent);
    if !n.is_finite() {
        return Err(kind_err(ErrKind::Integrity, "non-finite Number"));
    }
    Ok(n)
}

fn decode_meta_tuple(r: &mut Reader) -> Result<MetaTuple> {
    let target_hash = r.read_hash()?;
    let height = r.read_uint64()?;
    let target_type = decode_type(r)?;
    let key = decode_ordered_key(r)?;
    let num_leaves = r.read_uint64()?;
    Ok(MetaTuple { r#ref: Ref::new(target_hash, height, target_type), key, num_leaves })
}

fn decode_value_body(r: &mut Reader, ty: &Type) -> Result<Value> {
    Ok(match ty.kind() {
        ValueKind::Bool => Value::Bool(r.read_bool()?),
        ValueKind::Number => Value::Number(decode_number(r)?),
        ValueKind::String => Value::String(r.read_str()?),
        ValueKind::Type => Value::Type(decode_type(r)?),
        ValueKind::Ref => {
            let target_hash = r.read_hash()?;
            let height = r.read_uint64()?;
            let target_type = ty.elem_types()[0].clone();
            Value::Ref(Ref::new(target_hash, height, target_type))
        }
        ValueKind::Struct => {
            let desc = ty
                .struct_desc()
                .ok_or_else(|| kind_err(ErrKind::Integrity, "struct value with non-struct type"))?;
            let mut values = Vec::with_capacity(desc.fields.len());
            for _ in &desc.fields {
                values.push(decode_value(r)?);
            }
            Value::Struct(Struct::new(ty.clone(), values)?)
        }
        ValueKind::Blob => Value::Blob(decode_sequence(r, ty, ValueKind::Blob, decode_bytes_leaf)?),
        ValueKind::List => Value::List(decode_sequence(r, ty, ValueKind::List, decode_items_leaf)?),
        ValueKind::Set => Value::Set(decode_sequence(r, ty, ValueKind::Set, decode_items_leaf)?),
        ValueKind::Map => Value::Map(decode_sequence(r, ty, ValueKind::Map, decode_entries_leaf)?),
        other => {
            return Err(kind_err(
                ErrKind::Integrity,
                format!("{other:?} is not a decodable top-level value kind"),
            ))
        }
    })
}

fn decode_bytes_leaf(r: &mut Reader) -> Result<DecodedBody> {
    let len = r.read_uint32()? as usize;
    let mut bytes = Vec::with_capacity(len);
    for _ in 0..len {
        bytes.push(r.read_uint8()?);
    }
    Ok(DecodedBody::Bytes(bytes))
}

fn decode_items_leaf(r: &mut Reader) -> Result<DecodedBody> {
    let count = r.read_uint32()? as usize;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(decode_value(r)?);
    }
    Ok(DecodedBody::Items(items))
}

fn decode_entries_leaf(r: &mut Reader) -> Result<DecodedBody> {
    let count = r.read_uint32()? as usize;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let k = decode_value(r)?;
        let val = decode_value(r)?;
        entries.push((k, val));
    }
    Ok(DecodedBody::Entries(entries))
}

fn decode_sequence(
    r: &mut Reader,
    ty: &Type,
    kind: ValueKind,
    decode_leaf: fn(&mut Reader) -> Result<DecodedBody>,
) -> Result<Arc<dyn Sequence>> {
    let is_meta = r.read_bool()?;
    let body = if is_meta {
        let count = r.read_uint32()? as usize;
        let mut tuples = Vec::with_capacity(count);
        for _ in 0..count {
            tuples.push(decode_meta_tuple(r)?);
        }
        DecodedBody::Meta(tuples)
    } else {
        decode_leaf(r)?
    };
    Ok(Arc::new(DecodedSequence::new(kind, ty.clone(), is_meta, body)))
}

/// `true` if a decoded struct value's type matches the commit shape; a
/// thin re-export so callers of this crate don't need to reach into
/// `noms-types` just to check a decoded value.
pub fn is_commit(v: &Value) -> bool {
    matches!(v, Value::Struct(s) if looks_like_commit_type(&s.ty))
}

#[cfg(test)]
mod test {
    use super::*;
    use noms_types::{bool_type, make_list_type, make_map_type, number_type, string_type};
    use test_log::test;

    fn round_trip(v: &Value) -> Value {
        let mut w = Writer::new();
        encode_value(&mut w, v).unwrap();
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        let out = decode_value(&mut r).unwrap();
        assert!(r.at_end());
        out
    }

    #[test]
    fn primitives_round_trip() {
        assert!(matches!(round_trip(&Value::Bool(true)), Value::Bool(true)));
        assert!(matches!(round_trip(&Value::String("abc".into())), Value::String(s) if s == "abc"));
        let n = round_trip(&Value::Number(Number::from_i64(0)));
        assert_eq!(n.as_number().unwrap(), Number::from_i64(0));
    }

    #[test]
    fn rejects_non_finite_number() {
        let mut w = Writer::new();
        let nan = Number::new(i64::MAX, i64::MIN);
        assert!(!nan.is_finite());
        assert!(encode_number(&mut w, &nan).is_err());
    }

    #[test]
    fn leaf_list_round_trips() {
        let items = vec![Value::Number(Number::from_i64(1)), Value::Number(Number::from_i64(2))];
        let seq = DecodedSequence::new(
            ValueKind::List,
            make_list_type(number_type()),
            false,
            DecodedBody::Items(items),
        );
        let v = Value::List(Arc::new(seq));
        let out = round_trip(&v);
        match out {
            Value::List(seq) => assert_eq!(seq.len(), 2),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn leaf_map_round_trips() {
        let entries = vec![(Value::String("k".into()), Value::Bool(true))];
        let seq = DecodedSequence::new(
            ValueKind::Map,
            make_map_type(string_type(), bool_type()),
            false,
            DecodedBody::Entries(entries),
        );
        let v = Value::Map(Arc::new(seq));
        let out = round_trip(&v);
        match out {
            Value::Map(seq) => assert_eq!(seq.len(), 1),
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn decode_value_leaves_a_trailing_byte_unconsumed() {
        let mut w = Writer::new();
        encode_value(&mut w, &Value::Bool(true)).unwrap();
        let mut bytes = w.into_bytes();
        bytes.push(0xff);
        let mut r = Reader::new(&bytes);
        decode_value(&mut r).unwrap();
        assert!(!r.at_end());
    }

    #[test]
    fn chunk_decode_rejects_a_value_with_trailing_bytes() {
        let mut w = Writer::new();
        encode_value(&mut w, &Value::Bool(true)).unwrap();
        let mut bytes = w.into_bytes();
        bytes.push(0xff);
        let chunk = crate::Chunk::from_bytes(bytes);
        assert!(crate::decode(&chunk).is_err());
    }
}
