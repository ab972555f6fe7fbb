use std::fmt;
use std::sync::Arc;

use noms_base::{kind_err, Hash, Kind, Result};

use crate::kind::ValueKind;
use crate::number::Number;
use crate::ty::{self, Type};

/// A fully-decoded value. Collections (`Blob`/`List`/`Map`/`Set`) hold a
/// `Sequence` rather than their own leaf/meta storage directly: the
/// sequence implementations (chunked or in-memory) live above this crate,
/// to avoid a dependency cycle with the codec and chunker.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Number(Number),
    String(String),
    Blob(Arc<dyn Sequence>),
    List(Arc<dyn Sequence>),
    Map(Arc<dyn Sequence>),
    Set(Arc<dyn Sequence>),
    Ref(Ref),
    Struct(Struct),
    Type(Type),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Blob(_) => ValueKind::Blob,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Set(_) => ValueKind::Set,
            Value::Ref(_) => ValueKind::Ref,
            Value::Struct(_) => ValueKind::Struct,
            Value::Type(_) => ValueKind::Type,
        }
    }

    /// The structural type of this value. Primitives have a fixed type;
    /// collections, refs, structs and type values all carry their own.
    pub fn value_type(&self) -> Type {
        match self {
            Value::Bool(_) => ty::bool_type(),
            Value::Number(_) => ty::number_type(),
            Value::String(_) => ty::string_type(),
            Value::Blob(s) | Value::List(s) | Value::Map(s) | Value::Set(s) => {
                s.value_type().clone()
            }
            Value::Ref(r) => ty::make_ref_type(r.target_type.clone()),
            Value::Struct(s) => s.ty.clone(),
            Value::Type(_) => ty::type_type(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A typed pointer to content elsewhere in the store: the referent's
/// hash, its tree height (1 for a leaf chunk), and its declared type.
/// Equality considers all three fields; ordering is by hash alone, the
/// way the store orders and deduplicates refs it has never dereferenced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ref {
    pub target_hash: Hash,
    pub height: u64,
    pub target_type: Type,
}

impl Ref {
    pub fn new(target_hash: Hash, height: u64, target_type: Type) -> Self {
        Ref { target_hash, height, target_type }
    }
}

impl PartialOrd for Ref {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Ref {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.target_hash.cmp(&other.target_hash)
    }
}

/// An immutable, ordered tuple of field values paired with the `Type`
/// that names and orders them. Field order always matches the type's
/// (name-sorted) field order.
#[derive(Clone, Debug)]
pub struct Struct {
    pub ty: Type,
    values: Vec<Value>,
}

impl Struct {
    pub fn new(ty: Type, values: Vec<Value>) -> Result<Self> {
        let desc = ty
            .struct_desc()
            .ok_or_else(|| kind_err(Kind::Type, "Struct::new requires a struct type"))?;
        if desc.fields.len() != values.len() {
            return Err(kind_err(
                Kind::Type,
                format!(
                    "struct {} expects {} fields, got {}",
                    desc.name,
                    desc.fields.len(),
                    values.len()
                ),
            ));
        }
        for ((field_name, field_type), value) in desc.fields.iter().zip(&values) {
            let actual = value.value_type();
            if !ty::is_assignable(field_type, &actual) {
                return Err(kind_err(
                    Kind::Type,
                    format!(
                        "struct {} field {} expects {:?}, got {:?}",
                        desc.name, field_name, field_type, actual
                    ),
                ));
            }
        }
        Ok(Struct { ty, values })
    }

    pub fn name(&self) -> &str {
        &self.ty.struct_desc().expect("Struct always carries a struct type").name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        let desc = self.ty.struct_desc()?;
        let idx = desc.fields.iter().position(|(n, _)| n == field)?;
        self.values.get(idx)
    }

    /// Return a new struct with `field` set to `value`. If the field is
    /// new, the struct's type widens to include it (fields stay sorted by
    /// name); an existing field's declared type is replaced in the same
    /// way, matching the looseness the write path already assumes.
    pub fn with_field(&self, field: &str, value: Value) -> Result<Struct> {
        let desc = self.ty.struct_desc().expect("Struct always carries a struct type");
        let mut fields: Vec<(String, Type)> = desc.fields.clone();
        let mut values = self.values.clone();
        match desc.fields.iter().position(|(n, _)| n == field) {
            Some(idx) => {
                fields[idx].1 = value.value_type();
                values[idx] = value;
            }
            None => {
                fields.push((field.to_string(), value.value_type()));
                values.push(value);
            }
        }
        let name = desc.name.clone();
        let new_ty = ty::make_struct_type(name, fields.clone())?;
        // Field order may have shifted if the new name sorts earlier;
        // re-derive `values`' order from the (now sorted) type.
        let sorted_desc = new_ty.struct_desc().unwrap();
        let mut reordered = Vec::with_capacity(values.len());
        for (fname, _) in &sorted_desc.fields {
            let src_idx = fields.iter().position(|(n, _)| n == fname).unwrap();
            reordered.push(values[src_idx].clone());
        }
        Struct::new(new_ty, reordered)
    }
}

/// `true` if `ty` has the three-field shape (`meta`, `parents`, `value`)
/// that marks a struct as a commit. `parents` is checked for being a
/// `Set<Ref<_>>`; the referent's own shape is not re-checked recursively
/// since commit types are typically self-referential (a cyclic type).
pub fn looks_like_commit_type(t: &Type) -> bool {
    let Some(desc) = t.struct_desc() else { return false };
    if desc.fields.len() != 3 {
        return false;
    }
    let names: Vec<&str> = desc.fields.iter().map(|(n, _)| n.as_str()).collect();
    if names != ["meta", "parents", "value"] {
        return false;
    }
    let parents_ty = &desc.fields[1].1;
    matches!(parents_ty.kind(), ValueKind::Set)
        && parents_ty
            .elem_types()
            .first()
            .map(|t| t.kind() == ValueKind::Ref)
            .unwrap_or(false)
}

/// Either a primitive value (ordered by value) or a hash (ordered by
/// hash). Map and set implementations use this as the uniformly-sized
/// key a meta sequence's tuples carry, so non-primitive keys don't blow
/// up a meta tuple's size.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrderedKey {
    Primitive(PrimitiveKey),
    Hash(Hash),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimitiveKey {
    Bool(bool),
    Number(Number),
    Str(String),
}

/// One entry of a meta sequence: a reference to a child chunk, the
/// largest key that child covers, and how many leaf items it holds.
#[derive(Clone, Debug)]
pub struct MetaTuple {
    pub r#ref: Ref,
    pub key: OrderedKey,
    pub num_leaves: u64,
}

/// What a `Sequence` impl actually holds, handed out by `Sequence::body`.
/// Exactly one variant is meaningful for a given `ValueKind`/`is_meta`
/// combination; which one is the caller's responsibility to know.
pub enum SequenceBody<'a> {
    Items(&'a [Value]),
    Entries(&'a [(Value, Value)]),
    Bytes(&'a [u8]),
    Meta(&'a [MetaTuple]),
}

/// The "has a sequence" trait collections share instead of a common base
/// class: a `List`/`Set`/`Map`/`Blob` value is a thin wrapper around
/// whatever implements this, letting the concrete leaf/meta/chunked
/// representations live downstream of the codec without this crate
/// needing to know about them.
pub trait Sequence: fmt::Debug + Send + Sync {
    fn kind(&self) -> ValueKind;
    fn value_type(&self) -> &Type;
    fn len(&self) -> u64;
    fn is_meta(&self) -> bool;
    fn body(&self) -> SequenceBody<'_>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn struct_get_and_with_field_roundtrip() {
        let ty = ty::make_struct_type(
            "P",
            vec![("x".to_string(), ty::number_type())],
        )
        .unwrap();
        let s = Struct::new(ty, vec![Value::Number(Number::from_i64(1))]).unwrap();
        assert_eq!(s.get("x").unwrap().as_number().unwrap(), Number::from_i64(1));

        let s2 = s.with_field("y", Value::Bool(true)).unwrap();
        assert_eq!(s2.get("y").unwrap().as_bool(), Some(true));
        assert_eq!(s2.get("x").unwrap().as_number().unwrap(), Number::from_i64(1));
    }

    #[test]
    fn struct_new_rejects_arity_mismatch() {
        let ty = ty::make_struct_type("P", vec![("x".to_string(), ty::number_type())]).unwrap();
        assert!(Struct::new(ty, vec![]).is_err());
    }

    #[test]
    fn struct_new_rejects_a_field_value_of_the_wrong_type() {
        let ty = ty::make_struct_type("P", vec![("x".to_string(), ty::number_type())]).unwrap();
        assert!(Struct::new(ty, vec![Value::Bool(true)]).is_err());
    }

    #[test]
    fn struct_new_accepts_any_actual_type_for_a_field_declared_value() {
        let ty = ty::make_struct_type("P", vec![("x".to_string(), ty::value_type())]).unwrap();
        assert!(Struct::new(ty, vec![Value::Bool(true)]).is_ok());
    }

    #[test]
    fn commit_shape_detection() {
        let commit_ty = ty::make_struct_type(
            "Commit",
            vec![
                ("meta".to_string(), ty::make_struct_type("Meta", vec![]).unwrap()),
                (
                    "parents".to_string(),
                    ty::make_set_type(ty::make_ref_type(ty::Type::cycle(0))),
                ),
                ("value".to_string(), ty::value_type()),
            ],
        )
        .unwrap();
        assert!(looks_like_commit_type(&commit_ty));
        assert!(!looks_like_commit_type(&ty::number_type()));
    }
}
