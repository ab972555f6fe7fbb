// The tag byte space shared by `Type`'s descriptors and `Value`'s runtime
// discriminant. Order here becomes wire order once the codec encodes it;
// it must not be reshuffled after that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ValueKind {
    Bool = 0,
    Number = 1,
    String = 2,
    Blob = 3,
    List = 4,
    Map = 5,
    Set = 6,
    Ref = 7,
    Struct = 8,
    Type = 9,
    Cycle = 10,
    Union = 11,
    Value = 12,
}

impl ValueKind {
    pub fn from_u8(b: u8) -> Option<ValueKind> {
        Some(match b {
            0 => ValueKind::Bool,
            1 => ValueKind::Number,
            2 => ValueKind::String,
            3 => ValueKind::Blob,
            4 => ValueKind::List,
            5 => ValueKind::Map,
            6 => ValueKind::Set,
            7 => ValueKind::Ref,
            8 => ValueKind::Struct,
            9 => ValueKind::Type,
            10 => ValueKind::Cycle,
            11 => ValueKind::Union,
            12 => ValueKind::Value,
            _ => return None,
        })
    }

    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            ValueKind::Bool
                | ValueKind::Number
                | ValueKind::String
                | ValueKind::Blob
                | ValueKind::Type
                | ValueKind::Value
        )
    }

    pub fn is_compound(self) -> bool {
        matches!(
            self,
            ValueKind::List | ValueKind::Map | ValueKind::Set | ValueKind::Ref | ValueKind::Union
        )
    }
}
