// The structural type system: `Type` values are interned, so two
// independently-built descriptions of "the same" type (same kind, same
// children, same field names in the same order) always end up as the same
// `Arc` and therefore compare equal by pointer. Unions go through an extra
// canonicalization step (dedup, then sort members by a cheap order id) so
// that member order at the call site never affects identity.
//
// Recursive ("named") types are expressed with an explicit `Type::cycle`
// node: build the struct's field types as if the struct already existed,
// using `Type::cycle(0)` wherever the struct refers to itself (and
// `Type::cycle(n)` for the n-th enclosing struct, De Bruijn style), then
// hand the whole thing to `make_struct_type`. This is the post-normalization
// shape the original algorithm arrives at after a self-reference detection
// pass; building it directly sidesteps needing that pass here.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, OnceLock};

use noms_base::{kind_err, Kind, Result};

use crate::kind::ValueKind;

#[derive(Debug)]
struct TypeInner {
    id: u64,
    oid: u64,
    desc: Desc,
}

/// An interned, structurally-shared type descriptor.
#[derive(Clone, Debug)]
pub struct Type(Arc<TypeInner>);

#[derive(Debug)]
pub enum Desc {
    Primitive(ValueKind),
    Compound(ValueKind, Vec<Type>),
    Struct(StructDesc),
    Cycle(u32),
}

#[derive(Debug)]
pub struct StructDesc {
    pub name: String,
    pub fields: Vec<(String, Type)>,
}

impl Type {
    pub fn desc(&self) -> &Desc {
        &self.0.desc
    }

    pub fn kind(&self) -> ValueKind {
        match &self.0.desc {
            Desc::Primitive(k) => *k,
            Desc::Compound(k, _) => *k,
            Desc::Struct(_) => ValueKind::Struct,
            Desc::Cycle(_) => ValueKind::Cycle,
        }
    }

    /// Cheap, process-local order id used to canonicalize union member
    /// order. Not a content hash; never put on the wire.
    pub fn oid(&self) -> u64 {
        self.0.oid
    }

    pub fn elem_types(&self) -> &[Type] {
        match &self.0.desc {
            Desc::Compound(_, ts) => ts,
            _ => &[],
        }
    }

    pub fn struct_desc(&self) -> Option<&StructDesc> {
        match &self.0.desc {
            Desc::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn cycle_level(&self) -> Option<u32> {
        match &self.0.desc {
            Desc::Cycle(n) => Some(*n),
            _ => None,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Type {}
impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}
impl PartialOrd for Type {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Type {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.desc {
            Desc::Primitive(k) => write!(f, "{k:?}"),
            Desc::Compound(ValueKind::Union, members) => {
                write!(f, "Union<")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{m}")?;
                }
                write!(f, ">")
            }
            Desc::Compound(k, ts) => {
                write!(f, "{k:?}<")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ">")
            }
            Desc::Struct(s) => write!(f, "Struct {}", s.name),
            Desc::Cycle(n) => write!(f, "Cycle({n})"),
        }
    }
}

// --- interning -------------------------------------------------------

#[derive(Clone, PartialEq, Eq, Hash)]
enum TypeKey {
    Primitive(ValueKind),
    Compound(ValueKind, Vec<u64>),
    Struct(String, Vec<(String, u64)>),
    Cycle(u32),
}

struct Interner {
    next_id: u64,
    by_key: HashMap<TypeKey, Type>,
    by_oid: HashMap<u64, Type>,
}

fn interner() -> &'static Mutex<Interner> {
    static INTERNER: OnceLock<Mutex<Interner>> = OnceLock::new();
    INTERNER.get_or_init(|| {
        Mutex::new(Interner {
            next_id: 0,
            by_key: HashMap::new(),
            by_oid: HashMap::new(),
        })
    })
}

fn oid_of(desc: &Desc) -> u64 {
    let mut buf = Vec::new();
    match desc {
        Desc::Primitive(k) => {
            buf.push(0u8);
            buf.push(*k as u8);
        }
        Desc::Compound(ValueKind::Union, members) => {
            buf.push(1u8);
            buf.push(ValueKind::Union as u8);
            let combined = members.iter().fold(0u64, |acc, m| acc ^ m.oid());
            buf.extend_from_slice(&combined.to_le_bytes());
        }
        Desc::Compound(k, members) => {
            buf.push(1u8);
            buf.push(*k as u8);
            for m in members {
                buf.extend_from_slice(&m.oid().to_le_bytes());
            }
        }
        Desc::Struct(s) => {
            buf.push(2u8);
            buf.extend_from_slice(s.name.as_bytes());
            for (name, ty) in &s.fields {
                buf.push(0u8); // field separator
                buf.extend_from_slice(name.as_bytes());
                buf.extend_from_slice(&ty.oid().to_le_bytes());
            }
        }
        Desc::Cycle(n) => {
            buf.push(3u8);
            buf.extend_from_slice(&n.to_le_bytes());
        }
    }
    rapidhash::rapidhash(&buf)
}

fn key_of(desc: &Desc) -> TypeKey {
    match desc {
        Desc::Primitive(k) => TypeKey::Primitive(*k),
        Desc::Compound(k, ts) => TypeKey::Compound(*k, ts.iter().map(|t| t.0.id).collect()),
        Desc::Struct(s) => TypeKey::Struct(
            s.name.clone(),
            s.fields.iter().map(|(n, t)| (n.clone(), t.0.id)).collect(),
        ),
        Desc::Cycle(n) => TypeKey::Cycle(*n),
    }
}

fn has_cycle_node(desc: &Desc) -> bool {
    match desc {
        Desc::Cycle(_) => true,
        Desc::Compound(_, ts) => ts.iter().any(|t| matches!(t.desc(), Desc::Cycle(_))),
        Desc::Struct(s) => s.fields.iter().any(|(_, t)| matches!(t.desc(), Desc::Cycle(_))),
        Desc::Primitive(_) => false,
    }
}

fn intern(desc: Desc) -> Result<Type> {
    let key = key_of(&desc);
    let oid = oid_of(&desc);
    let mut guard = interner().lock().unwrap();
    if let Some(existing) = guard.by_key.get(&key) {
        return Ok(existing.clone());
    }
    if let Some(existing) = guard.by_oid.get(&oid) {
        if has_cycle_node(existing.desc()) != has_cycle_node(&desc) {
            return Err(kind_err(
                Kind::Type,
                "rolled representation of a cyclic type collides with an unrolled one",
            ));
        }
    }
    let id = guard.next_id;
    guard.next_id += 1;
    let ty = Type(Arc::new(TypeInner { id, oid, desc }));
    guard.by_key.insert(key, ty.clone());
    guard.by_oid.entry(oid).or_insert_with(|| ty.clone());
    Ok(ty)
}

pub fn make_primitive_type(kind: ValueKind) -> Type {
    debug_assert!(kind.is_primitive());
    intern(Desc::Primitive(kind)).expect("primitive interning cannot fail")
}

pub fn bool_type() -> Type {
    make_primitive_type(ValueKind::Bool)
}
pub fn number_type() -> Type {
    make_primitive_type(ValueKind::Number)
}
pub fn string_type() -> Type {
    make_primitive_type(ValueKind::String)
}
pub fn blob_type() -> Type {
    make_primitive_type(ValueKind::Blob)
}
pub fn type_type() -> Type {
    make_primitive_type(ValueKind::Type)
}
pub fn value_type() -> Type {
    make_primitive_type(ValueKind::Value)
}

/// Is a value typed `actual` acceptable somewhere `declared` is required?
/// True for an exact match, and — per the top-`Value`-type write-time
/// compatibility exception — whenever either side is the catch-all
/// `Value` type: a field/ref declared `Value` takes anything, and
/// anything declared takes a value that was itself written under the
/// catch-all type.
pub fn is_assignable(declared: &Type, actual: &Type) -> bool {
    actual == declared || *actual == value_type() || *declared == value_type()
}

pub fn make_list_type(elem: Type) -> Type {
    intern(Desc::Compound(ValueKind::List, vec![elem])).expect("list interning cannot fail")
}
pub fn make_set_type(elem: Type) -> Type {
    intern(Desc::Compound(ValueKind::Set, vec![elem])).expect("set interning cannot fail")
}
pub fn make_map_type(key: Type, value: Type) -> Type {
    intern(Desc::Compound(ValueKind::Map, vec![key, value])).expect("map interning cannot fail")
}
pub fn make_ref_type(target: Type) -> Type {
    intern(Desc::Compound(ValueKind::Ref, vec![target])).expect("ref interning cannot fail")
}

pub fn make_cycle_type(level: u32) -> Type {
    intern(Desc::Cycle(level)).expect("cycle interning cannot fail")
}

/// Flatten, dedup, and canonically order `members`, collapsing a
/// singleton to the bare member type (`Union<T> == T`).
pub fn make_union_type(members: Vec<Type>) -> Type {
    let mut flat: Vec<Type> = Vec::new();
    for m in members {
        match m.desc() {
            Desc::Compound(ValueKind::Union, inner) => flat.extend(inner.iter().cloned()),
            _ => flat.push(m),
        }
    }
    flat.sort_by_key(|t| t.0.id);
    flat.dedup_by(|a, b| a == b);
    if flat.len() == 1 {
        return flat.into_iter().next().unwrap();
    }
    // Canonical wire/display order is by oid, independent of the
    // order flattening happened to produce.
    flat.sort_by_key(|t| t.oid());
    intern(Desc::Compound(ValueKind::Union, flat)).expect("union interning cannot fail")
}

// Struct and field names match `[A-Za-z][A-Za-z0-9_]*`.
fn valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Construct (and intern) a struct type. Fields are sorted by name; field
/// and struct names must match `[A-Za-z][A-Za-z0-9_]*`. Field types may
/// contain `Type::cycle(n)` nodes referring back to an enclosing struct.
pub fn make_struct_type(name: impl Into<String>, mut fields: Vec<(String, Type)>) -> Result<Type> {
    let name = name.into();
    if !name.is_empty() && !valid_name(&name) {
        return Err(kind_err(Kind::Syntax, format!("invalid struct name: {name}")));
    }
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    for w in fields.windows(2) {
        if w[0].0 == w[1].0 {
            return Err(kind_err(
                Kind::Type,
                format!("duplicate field name: {}", w[0].0),
            ));
        }
    }
    for (fname, _) in &fields {
        if !valid_name(fname) {
            return Err(kind_err(Kind::Syntax, format!("invalid field name: {fname}")));
        }
    }
    intern(Desc::Struct(StructDesc { name, fields }))
}

impl Type {
    /// `Type::cycle(n)` is a free function in disguise; kept as an
    /// associated fn so call sites read `Type::cycle(0)` at use-sites
    /// building recursive struct definitions.
    pub fn cycle(level: u32) -> Type {
        make_cycle_type(level)
    }
}
