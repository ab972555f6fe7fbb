// A fully-materialized `Sequence`: exactly what falls out of decoding one
// chunk's worth of collection body. Meta tuples point at child chunks by
// hash/ref, not yet fetched; leaf bodies hold their items directly. The
// tree-shaped, lazily-fetched cursor machinery that wraps these to form a
// navigable prolly tree lives downstream of this crate.
use std::fmt;

use noms_types::{MetaTuple, Sequence, SequenceBody, Type, Value, ValueKind};

#[derive(Debug)]
pub enum DecodedBody {
    Items(Vec<Value>),
    Entries(Vec<(Value, Value)>),
    Bytes(Vec<u8>),
    Meta(Vec<MetaTuple>),
}

#[derive(Debug)]
pub struct DecodedSequence {
    kind: ValueKind,
    value_type: Type,
    is_meta: bool,
    body: DecodedBody,
}

impl DecodedSequence {
    pub fn new(kind: ValueKind, value_type: Type, is_meta: bool, body: DecodedBody) -> Self {
        DecodedSequence { kind, value_type, is_meta, body }
    }
}

impl Sequence for DecodedSequence {
    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn value_type(&self) -> &Type {
        &self.value_type
    }

    fn len(&self) -> u64 {
        match &self.body {
            DecodedBody::Items(v) => v.len() as u64,
            DecodedBody::Entries(v) => v.len() as u64,
            DecodedBody::Bytes(v) => v.len() as u64,
            DecodedBody::Meta(v) => v.iter().map(|t| t.num_leaves).sum(),
        }
    }

    fn is_meta(&self) -> bool {
        self.is_meta
    }

    fn body(&self) -> SequenceBody<'_> {
        match &self.body {
            DecodedBody::Items(v) => SequenceBody::Items(v),
            DecodedBody::Entries(v) => SequenceBody::Entries(v),
            DecodedBody::Bytes(v) => SequenceBody::Bytes(v),
            DecodedBody::Meta(v) => SequenceBody::Meta(v),
        }
    }
}

impl fmt::Display for DecodedSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({} items, meta={})", self.kind, self.len(), self.is_meta)
    }
}
