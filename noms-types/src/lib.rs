mod kind;
mod number;
mod ty;
mod value;

pub use kind::ValueKind;
pub use number::Number;
pub use ty::{
    bool_type, is_assignable, make_cycle_type, make_list_type, make_map_type, make_ref_type,
    make_set_type, make_struct_type, make_union_type, number_type, string_type, type_type,
    value_type, blob_type, Desc, StructDesc, Type,
};
pub use value::{
    looks_like_commit_type, MetaTuple, OrderedKey, PrimitiveKey, Ref, Sequence, SequenceBody,
    Struct, Value,
};
