//! Payment amount parsing
//!
//! Amounts arrive as untrusted decimal strings (legacy trigger payloads) or
//! JSON reals (legacy proposal payloads). Both normalize to integer minor
//! units. Every rejection is a value, never a panic.

use crate::error::{AmountError, GovernanceError};
use shared_types::{money_range, Amount, COIN, COIN_DECIMALS};

/// Largest mantissa representable by the fixed-point parser.
const UPPER_BOUND: i64 = 1_000_000_000_000_000_000 - 1;

/// Longest accepted amount string.
pub const MAX_AMOUNT_STRING_LEN: usize = 20;

/// Parse and range-check a decimal amount string into minor units.
pub fn parse_payment_amount(text: &str) -> Result<Amount, AmountError> {
    if text.is_empty() {
        return Err(AmountError::Empty);
    }
    if text.len() > MAX_AMOUNT_STRING_LEN {
        return Err(AmountError::TooLong);
    }
    // No spaces, signs or scientific notation
    if !text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(AmountError::InvalidCharacter);
    }
    match text.find('.') {
        Some(0) => return Err(AmountError::LeadingDecimalPoint),
        Some(pos) if text[pos + 1..].contains('.') => {
            return Err(AmountError::TooManyDecimalPoints)
        }
        _ => {}
    }

    let amount = parse_fixed_point(text, COIN_DECIMALS)
        .ok_or_else(|| AmountError::FixedPoint(text.to_string()))?;
    if !money_range(amount) {
        return Err(AmountError::OutOfRange);
    }
    Ok(amount)
}

/// Parse an unsigned decimal string of digits and at most one point into a
/// fixed-point integer scaled by `10^decimals`.
///
/// Follows the strict JSON number grammar: a single leading zero only, at
/// least one digit after a point, trailing fractional zeros ignored when
/// counting precision. Returns `None` on any violation or overflow.
pub fn parse_fixed_point(text: &str, decimals: u32) -> Option<i64> {
    let bytes = text.as_bytes();
    let mut pos = 0usize;
    let mut mantissa: i64 = 0;
    let mut trailing_zeros: i64 = 0;
    let mut point_offset: i64 = 0;

    match bytes.first() {
        Some(b'0') => pos += 1,
        Some(b'1'..=b'9') => {
            while let Some(&digit @ b'0'..=b'9') = bytes.get(pos) {
                if !push_digit(digit, &mut mantissa, &mut trailing_zeros) {
                    return None;
                }
                pos += 1;
            }
        }
        _ => return None,
    }

    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        if !matches!(bytes.get(pos), Some(b'0'..=b'9')) {
            return None;
        }
        while let Some(&digit @ b'0'..=b'9') = bytes.get(pos) {
            if !push_digit(digit, &mut mantissa, &mut trailing_zeros) {
                return None;
            }
            point_offset += 1;
            pos += 1;
        }
    }

    if pos != bytes.len() {
        return None;
    }

    let exponent = trailing_zeros - point_offset + i64::from(decimals);
    if !(0..18).contains(&exponent) {
        return None;
    }
    for _ in 0..exponent {
        if mantissa > UPPER_BOUND / 10 {
            return None;
        }
        mantissa *= 10;
    }
    (mantissa <= UPPER_BOUND).then_some(mantissa)
}

fn push_digit(digit: u8, mantissa: &mut i64, trailing_zeros: &mut i64) -> bool {
    if digit == b'0' {
        *trailing_zeros += 1;
        return true;
    }
    for _ in 0..=*trailing_zeros {
        if *mantissa > UPPER_BOUND / 10 {
            return false;
        }
        *mantissa *= 10;
    }
    *mantissa += i64::from(digit - b'0');
    *trailing_zeros = 0;
    true
}

/// Render minor units as a display-unit decimal string.
///
/// Trailing fractional zeros are dropped, so `150_000_000` renders as `1.5`
/// and `100_000_000` as `1`.
pub fn format_amount(amount: Amount) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let coin = COIN.unsigned_abs();
    let whole = abs / coin;
    let frac = abs % coin;
    if frac == 0 {
        return format!("{sign}{whole}");
    }
    let frac = format!("{:08}", frac);
    format!("{sign}{whole}.{}", frac.trim_end_matches('0'))
}

/// Convert a display-unit JSON real into minor units.
///
/// The value is rounded to 8 fractional digits through its decimal
/// rendering; float multiplication would truncate values like `1.15`.
pub fn amount_from_display(value: f64) -> Result<Amount, GovernanceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(GovernanceError::ArithmeticOverflow(value.to_string()));
    }
    let rendered = format!("{:.8}", value);
    let amount = parse_fixed_point(&rendered, COIN_DECIMALS)
        .ok_or(GovernanceError::ArithmeticOverflow(rendered))?;
    if !money_range(amount) {
        return Err(GovernanceError::AmountOutOfRange(amount));
    }
    Ok(amount)
}
