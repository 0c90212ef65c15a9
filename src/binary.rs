/// One-byte subtype carried alongside every binary blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinarySubtype {
    Generic,
    Function,
    /// Deprecated byte-array form. Its payload carries a redundant inner
    /// 4-byte length that must equal the outer length minus 4.
    BinaryOld,
    UuidOld,
    Uuid,
    Md5,
    Encrypted,
    Column,
    Sensitive,
    /// 0x80 and above is caller-defined.
    UserDefined(u8),
    /// Unassigned values below 0x80, carried through untouched.
    Reserved(u8),
}

impl BinarySubtype {
    pub fn from_u8(n: u8) -> BinarySubtype {
        match n {
            0x00 => BinarySubtype::Generic,
            0x01 => BinarySubtype::Function,
            0x02 => BinarySubtype::BinaryOld,
            0x03 => BinarySubtype::UuidOld,
            0x04 => BinarySubtype::Uuid,
            0x05 => BinarySubtype::Md5,
            0x06 => BinarySubtype::Encrypted,
            0x07 => BinarySubtype::Column,
            0x08 => BinarySubtype::Sensitive,
            0x80..=0xFF => BinarySubtype::UserDefined(n),
            _ => BinarySubtype::Reserved(n),
        }
    }

    pub fn into_u8(self) -> u8 {
        match self {
            BinarySubtype::Generic => 0x00,
            BinarySubtype::Function => 0x01,
            BinarySubtype::BinaryOld => 0x02,
            BinarySubtype::UuidOld => 0x03,
            BinarySubtype::Uuid => 0x04,
            BinarySubtype::Md5 => 0x05,
            BinarySubtype::Encrypted => 0x06,
            BinarySubtype::Column => 0x07,
            BinarySubtype::Sensitive => 0x08,
            BinarySubtype::UserDefined(n) => n,
            BinarySubtype::Reserved(n) => n,
        }
    }
}

impl From<BinarySubtype> for u8 {
    fn from(val: BinarySubtype) -> u8 {
        val.into_u8()
    }
}

impl From<u8> for BinarySubtype {
    fn from(val: u8) -> BinarySubtype {
        BinarySubtype::from_u8(val)
    }
}

/// An owned binary blob with its subtype.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Binary {
    pub subtype: BinarySubtype,
    pub bytes: Vec<u8>,
}

impl Binary {
    pub fn new(subtype: BinarySubtype, bytes: Vec<u8>) -> Binary {
        Binary { subtype, bytes }
    }
}

/// A binary blob borrowed from a decode buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinaryRef<'a> {
    pub subtype: BinarySubtype,
    pub bytes: &'a [u8],
}

impl<'a> BinaryRef<'a> {
    pub fn to_binary(&self) -> Binary {
        Binary {
            subtype: self.subtype,
            bytes: self.bytes.to_vec(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn subtype_round_trip() {
        for n in 0..=255u8 {
            assert_eq!(BinarySubtype::from_u8(n).into_u8(), n);
        }
        assert_eq!(BinarySubtype::from_u8(0x02), BinarySubtype::BinaryOld);
        assert_eq!(BinarySubtype::from_u8(0x42), BinarySubtype::Reserved(0x42));
        assert_eq!(
            BinarySubtype::from_u8(0x80),
            BinarySubtype::UserDefined(0x80)
        );
    }
}
