use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::TypeError;

/// Parse a non-negative decimal field.
///
/// Thousands separators and currency symbols are not accepted. The result is
/// normalized so `"1000.00"` and `"1000"` store identically.
pub fn parse_amount(field: &'static str, raw: &str) -> Result<Decimal, TypeError> {
    let value = Decimal::from_str(raw.trim()).map_err(|_| TypeError::NotNumeric {
        field,
        value: raw.to_string(),
    })?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(TypeError::Negative { field, value });
    }
    Ok(value.normalize())
}
