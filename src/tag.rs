/// Wire format element tags.
///
/// Every element in an encoded document starts with one of these bytes,
/// followed by the NUL-terminated key and the type-specific payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementType {
    Double,
    String,
    EmbeddedDocument,
    Array,
    Binary,
    Undefined,
    ObjectId,
    Boolean,
    DateTime,
    Null,
    Regexp,
    DbPointer,
    Code,
    Symbol,
    CodeWithScope,
    Int32,
    Timestamp,
    Int64,
    Decimal128,
    MinKey,
    MaxKey,
}

impl ElementType {
    /// Construct a tag from a single byte. Returns `None` for bytes this
    /// codec does not recognize.
    pub fn from_u8(n: u8) -> Option<ElementType> {
        match n {
            0x01 => Some(ElementType::Double),
            0x02 => Some(ElementType::String),
            0x03 => Some(ElementType::EmbeddedDocument),
            0x04 => Some(ElementType::Array),
            0x05 => Some(ElementType::Binary),
            0x06 => Some(ElementType::Undefined),
            0x07 => Some(ElementType::ObjectId),
            0x08 => Some(ElementType::Boolean),
            0x09 => Some(ElementType::DateTime),
            0x0A => Some(ElementType::Null),
            0x0B => Some(ElementType::Regexp),
            0x0C => Some(ElementType::DbPointer),
            0x0D => Some(ElementType::Code),
            0x0E => Some(ElementType::Symbol),
            0x0F => Some(ElementType::CodeWithScope),
            0x10 => Some(ElementType::Int32),
            0x11 => Some(ElementType::Timestamp),
            0x12 => Some(ElementType::Int64),
            0x13 => Some(ElementType::Decimal128),
            0x7F => Some(ElementType::MaxKey),
            0xFF => Some(ElementType::MinKey),
            _ => None,
        }
    }

    /// Convert a tag into its single-byte wire representation.
    pub fn into_u8(self) -> u8 {
        match self {
            ElementType::Double => 0x01,
            ElementType::String => 0x02,
            ElementType::EmbeddedDocument => 0x03,
            ElementType::Array => 0x04,
            ElementType::Binary => 0x05,
            ElementType::Undefined => 0x06,
            ElementType::ObjectId => 0x07,
            ElementType::Boolean => 0x08,
            ElementType::DateTime => 0x09,
            ElementType::Null => 0x0A,
            ElementType::Regexp => 0x0B,
            ElementType::DbPointer => 0x0C,
            ElementType::Code => 0x0D,
            ElementType::Symbol => 0x0E,
            ElementType::CodeWithScope => 0x0F,
            ElementType::Int32 => 0x10,
            ElementType::Timestamp => 0x11,
            ElementType::Int64 => 0x12,
            ElementType::Decimal128 => 0x13,
            ElementType::MaxKey => 0x7F,
            ElementType::MinKey => 0xFF,
        }
    }
}

impl From<ElementType> for u8 {
    fn from(val: ElementType) -> u8 {
        val.into_u8()
    }
}
