use rust_decimal::Decimal;
use std::num::IntErrorKind;

/// Decimal places between a base unit and one native token.
pub const NATIVE_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid base-{radix} digits in {raw:?}")]
    InvalidDigits { raw: String, radix: u32 },
    #[error("amount {0:?} out of range")]
    Overflow(String),
}

fn parse_radix(digits: &str, radix: u32, raw: &str) -> Result<u128, AmountError> {
    if digits.is_empty() {
        return Err(AmountError::Empty);
    }
    u128::from_str_radix(digits, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => AmountError::Overflow(raw.to_string()),
        _ => AmountError::InvalidDigits {
            raw: raw.to_string(),
            radix,
        },
    })
}

/// Parse an integer base-unit amount.
///
/// A `0x` prefix selects base 16, anything else is base 10. Reading one
/// encoding as the other is silently wrong by orders of magnitude, so the
/// prefix is the only signal used.
pub fn parse_base_units(raw: &str) -> Result<u128, AmountError> {
    let s = raw.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => parse_radix(hex, 16, raw),
        None => parse_radix(s, 10, raw),
    }
}

/// Base units -> native units (scale 10^18).
pub fn base_units_to_native(units: u128) -> Result<Decimal, AmountError> {
    let signed = i128::try_from(units).map_err(|_| AmountError::Overflow(units.to_string()))?;
    Decimal::try_from_i128_with_scale(signed, NATIVE_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|_| AmountError::Overflow(units.to_string()))
}

pub fn parse_native_amount(raw: &str) -> Result<Decimal, AmountError> {
    base_units_to_native(parse_base_units(raw)?)
}

/// Parse a count such as a JSON-RPC nonce (`0x1a`) or a plain decimal.
pub fn parse_quantity(raw: &str) -> Result<u64, AmountError> {
    let v = parse_base_units(raw)?;
    u64::try_from(v).map_err(|_| AmountError::Overflow(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::ToPrimitive;
    use std::str::FromStr;

    #[test]
    fn test_hex_branch() {
        assert_eq!(parse_base_units("0x2c68119335cd870").unwrap(), 199_989_178_700_454_000);
        assert_eq!(parse_base_units("0X1A").unwrap(), 26);
        assert_eq!(parse_base_units("0x0").unwrap(), 0);
    }

    #[test]
    fn test_decimal_branch() {
        assert_eq!(parse_base_units("199989178700454000").unwrap(), 199_989_178_700_454_000);
        assert_eq!(parse_base_units(" 42 ").unwrap(), 42);
        assert_eq!(parse_base_units("0").unwrap(), 0);
    }

    #[test]
    fn test_same_digits_differ_by_encoding() {
        // "10" is ten, "0x10" is sixteen.
        assert_eq!(parse_base_units("10").unwrap(), 10);
        assert_eq!(parse_base_units("0x10").unwrap(), 16);
    }

    #[test]
    fn test_known_balance_scenario() {
        let amount = parse_native_amount("0x2c68119335cd870").unwrap();
        assert_eq!(amount, Decimal::from_str("0.199989178700454").unwrap());
        let f = amount.to_f64().unwrap();
        assert!((f - 0.199_989_18).abs() < 1e-8);
    }

    #[test]
    fn test_hex_and_decimal_encodings_agree() {
        // 1.5 native units
        let hex = parse_native_amount("0x14d1120d7b160000").unwrap();
        let dec = parse_native_amount("1500000000000000000").unwrap();
        assert_eq!(hex, dec);
        assert_eq!(dec, Decimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_rejects_empty_and_bad_digits() {
        assert_eq!(parse_base_units(""), Err(AmountError::Empty));
        assert_eq!(parse_base_units("0x"), Err(AmountError::Empty));
        assert!(matches!(
            parse_base_units("12ab"),
            Err(AmountError::InvalidDigits { radix: 10, .. })
        ));
        assert!(matches!(
            parse_base_units("0xzz"),
            Err(AmountError::InvalidDigits { radix: 16, .. })
        ));
        assert!(parse_base_units("-5").is_err());
    }

    #[test]
    fn test_overflow() {
        let too_big = format!("0x{}", "f".repeat(33));
        assert!(matches!(
            parse_base_units(&too_big),
            Err(AmountError::Overflow(_))
        ));
        // Fits u128 but not the 96-bit decimal mantissa.
        assert!(matches!(
            base_units_to_native(u128::MAX >> 1),
            Err(AmountError::Overflow(_))
        ));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1f4").unwrap(), 500);
        assert_eq!(parse_quantity("77").unwrap(), 77);
        assert!(parse_quantity(&format!("0x{}", "f".repeat(17))).is_err());
    }
}
