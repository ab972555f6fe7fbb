// Type serialization: a `Struct` records `(name, field_count,
// (name, field_type)*)`; a `Cycle` records its level; a `Union` records
// member count followed by member types in canonical (OID) order, which
// `make_union_type` already leaves them in.

use noms_base::{kind_err, Kind as ErrKind, Result};
use noms_types::{
    bool_type, make_cycle_type, make_list_type, make_map_type, make_ref_type, make_set_type,
    make_struct_type, make_union_type, number_type, string_type, type_type, value_type,
    blob_type, Desc, Type, ValueKind,
};

use crate::ioutil::{Reader, Writer};

pub fn encode_type(w: &mut Writer, t: &Type) -> Result<()> {
    let kind = t.kind();
    w.write_uint8(kind as u8);
    match t.desc() {
        Desc::Primitive(_) => {}
        Desc::Compound(ValueKind::Union, members) => {
            w.write_uint32(members.len() as u32);
            for m in members {
                encode_type(w, m)?;
            }
        }
        Desc::Compound(_, members) => {
            for m in members {
                encode_type(w, m)?;
            }
        }
        Desc::Struct(s) => {
            w.write_str(&s.name);
            w.write_uint32(s.fields.len() as u32);
            for (name, field_ty) in &s.fields {
                w.write_str(name);
                encode_type(w, field_ty)?;
            }
        }
        Desc::Cycle(level) => {
            w.write_uint32(*level);
        }
    }
    Ok(())
}

pub fn decode_type(r: &mut Reader) -> Result<Type> {
    let tag = r.read_uint8()?;
    let kind = ValueKind::from_u8(tag)
        .ok_or_else(|| kind_err(ErrKind::Integrity, format!("unknown type kind tag {tag}")))?;
    Ok(match kind {
        ValueKind::Bool => bool_type(),
        ValueKind::Number => number_type(),
        ValueKind::String => string_type(),
        ValueKind::Blob => blob_type(),
        ValueKind::Type => type_type(),
        ValueKind::Value => value_type(),
        ValueKind::List => make_list_type(decode_type(r)?),
        ValueKind::Set => make_set_type(decode_type(r)?),
        ValueKind::Map => {
            let k = decode_type(r)?;
            let v = decode_type(r)?;
            make_map_type(k, v)
        }
        ValueKind::Ref => make_ref_type(decode_type(r)?),
        ValueKind::Union => {
            let count = r.read_uint32()? as usize;
            let mut members = Vec::with_capacity(count);
            for _ in 0..count {
                members.push(decode_type(r)?);
            }
            make_union_type(members)
        }
        ValueKind::Struct => {
            let name = r.read_str()?;
            let count = r.read_uint32()? as usize;
            let mut fields = Vec::with_capacity(count);
            for _ in 0..count {
                let fname = r.read_str()?;
                let fty = decode_type(r)?;
                fields.push((fname, fty));
            }
            make_struct_type(name, fields)?
        }
        ValueKind::Cycle => make_cycle_type(r.read_uint32()?),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    fn round_trip(t: &Type) -> Type {
        let mut w = Writer::new();
        encode_type(&mut w, t).unwrap();
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        let out = decode_type(&mut r).unwrap();
        assert!(r.at_end());
        out
    }

    #[test]
    fn primitive_types_round_trip() {
        assert_eq!(round_trip(&bool_type()), bool_type());
        assert_eq!(round_trip(&number_type()), number_type());
        assert_eq!(round_trip(&string_type()), string_type());
    }

    #[test]
    fn compound_types_round_trip() {
        let list_ty = make_list_type(number_type());
        assert_eq!(round_trip(&list_ty), list_ty);
        let map_ty = make_map_type(string_type(), bool_type());
        assert_eq!(round_trip(&map_ty), map_ty);
    }

    #[test]
    fn struct_type_round_trips_with_sorted_fields() {
        let s = make_struct_type(
            "Pair",
            vec![("b".to_string(), bool_type()), ("a".to_string(), number_type())],
        )
        .unwrap();
        assert_eq!(round_trip(&s), s);
    }

    #[test]
    fn union_type_round_trips() {
        let u = make_union_type(vec![bool_type(), number_type(), string_type()]);
        assert_eq!(round_trip(&u), u);
    }
}
