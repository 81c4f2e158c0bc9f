use std::fmt;
use std::str::FromStr;

use crate::OcdError;

/// Parses a numeric literal the way OpenOCD scripts write them.
///
/// Plain decimal as well as `0x`, `0o` and `0b` prefixed literals are accepted.
pub fn parse_u32(input: &str) -> Result<u32, OcdError> {
    let text = input.trim();
    parse_int::parse(text).map_err(|source| OcdError::InvalidNumber {
        text: text.to_string(),
        source,
    })
}

/// 64-bit variant of [`parse_u32`].
pub fn parse_u64(input: &str) -> Result<u64, OcdError> {
    let text = input.trim();
    parse_int::parse(text).map_err(|source| OcdError::InvalidNumber {
        text: text.to_string(),
        source,
    })
}

/// The address of a 32-bit memory mapped register.
///
/// Rendered as the zero padded token OpenOCD expects on the wire:
///
/// ```
/// use ocd_session::RegisterAddress;
///
/// let address: RegisterAddress = "0x40310388".parse().unwrap();
/// assert_eq!(address.to_string(), "0x40310388");
/// assert_eq!(RegisterAddress::from(255).to_string(), "0x000000FF");
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterAddress(pub u32);

impl RegisterAddress {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for RegisterAddress {
    fn from(address: u32) -> Self {
        Self(address)
    }
}

impl FromStr for RegisterAddress {
    type Err = OcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u32(s).map(Self)
    }
}

impl fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// A contiguous range of bits inside a register value.
///
/// The range is not checked against the register width, bits above bit 31 simply read as zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BitField {
    /// Index of the least significant bit of the field.
    pub lsb: u32,
    /// Number of bits in the field.
    pub width: u32,
}

impl BitField {
    pub fn new(lsb: u32, width: u32) -> Self {
        Self { lsb, width }
    }

    /// A field covering the single bit `bit`.
    pub fn bit(bit: u32) -> Self {
        Self::new(bit, 1)
    }

    /// Index of the most significant bit, as shown in `bits[msb:lsb]`.
    pub fn msb(&self) -> u32 {
        self.lsb.saturating_add(self.width).saturating_sub(1)
    }

    pub fn mask(&self) -> u64 {
        1u64.checked_shl(self.width)
            .map(|bit| bit - 1)
            .unwrap_or(u64::MAX)
    }

    /// Extracts the field from a raw register value.
    pub fn extract(&self, raw: u32) -> u32 {
        let shifted = u64::from(raw).checked_shr(self.lsb).unwrap_or(0);
        // `shifted` never exceeds 32 bits, so neither does the masked value.
        (shifted & self.mask()) as u32
    }
}

impl fmt::Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bits[{}:{}]", self.msb(), self.lsb)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("0x40310388", 0x4031_0388; "hex")]
    #[test_case("1234", 1234; "decimal")]
    #[test_case("0b101", 5; "binary")]
    #[test_case("  0x7 ", 7; "surrounding whitespace")]
    fn parses_addresses(text: &str, expected: u32) {
        let address: RegisterAddress = text.parse().unwrap();
        assert_eq!(address, RegisterAddress(expected));
    }

    #[test]
    fn rejects_garbage() {
        let error = "PRT_PC".parse::<RegisterAddress>().unwrap_err();
        assert!(matches!(error, OcdError::InvalidNumber { ref text, .. } if text == "PRT_PC"));
    }

    #[test]
    fn rejects_values_wider_than_32_bits() {
        assert!(parse_u32("0x1_0000_0000").is_err());
        assert_eq!(parse_u64("0x100000000").unwrap(), 0x1_0000_0000);
    }

    #[test]
    fn renders_wire_token() {
        assert_eq!(RegisterAddress(0x4031_0980).to_string(), "0x40310980");
        assert_eq!(RegisterAddress(0).to_string(), "0x00000000");
    }

    #[test_case(0x0000_0002, 0, 3, 0x2; "low bits")]
    #[test_case(0xF0F0_0000, 20, 4, 0xF; "middle nibble")]
    #[test_case(0x8000_0000, 31, 1, 1; "top bit")]
    #[test_case(0xDEAD_BEEF, 0, 32, 0xDEAD_BEEF; "full width")]
    #[test_case(0xDEAD_BEEF, 32, 4, 0; "shifted past the register")]
    #[test_case(0xDEAD_BEEF, 28, 8, 0xD; "field running off the top")]
    fn extracts_fields(raw: u32, lsb: u32, width: u32, expected: u32) {
        assert_eq!(BitField::new(lsb, width).extract(raw), expected);
    }

    #[test]
    fn extraction_matches_shift_and_mask() {
        let raw = 0xA5C3_3C5A_u32;
        for lsb in 0..32 {
            for width in 1..=(32 - lsb) {
                let expected = (u64::from(raw) >> lsb) & ((1u64 << width) - 1);
                assert_eq!(u64::from(BitField::new(lsb, width).extract(raw)), expected);
            }
        }
    }

    #[test]
    fn displays_bit_range() {
        assert_eq!(BitField::new(0, 3).to_string(), "bits[2:0]");
        assert_eq!(BitField::bit(7).to_string(), "bits[7:7]");
    }

    #[test_case(0, 3, 2; "low field")]
    #[test_case(31, 1, 31; "top bit")]
    #[test_case(5, 0, 4; "empty field")]
    #[test_case(u32::MAX, 2, u32::MAX; "lsb at the end of the range")]
    #[test_case(4, u32::MAX, u32::MAX; "width at the end of the range")]
    fn msb_saturates(lsb: u32, width: u32, expected: u32) {
        assert_eq!(BitField::new(lsb, width).msb(), expected);
    }

    #[test]
    fn out_of_range_field_reads_zero_and_displays() {
        let field = BitField::new(u32::MAX, 2);

        assert_eq!(field.extract(0xFFFF_FFFF), 0);
        assert_eq!(field.to_string(), "bits[4294967295:4294967295]");
    }
}
