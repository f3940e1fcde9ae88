use crate::{NodepackerError, Result};

const MILLI: i128 = 1000;
const BYTES_PER_MEGABYTE: i128 = 1_000_000;
const MAX_MANTISSA_DIGITS: usize = 30;
const MAX_EXPONENT: u32 = 18;

/// Parse CPU quantity (e.g., "2", "100m", "0.5") into millicores.
///
/// Fractional millicores round up, matching the Kubernetes quantity type.
pub fn parse_cpu(s: &str) -> Result<i64> {
    let (num, den) = parse_quantity(s)?;
    to_i64(s, ceil_div(checked_mul(s, num, MILLI)?, den))
}

/// Parse memory quantity (e.g., "128Mi", "1G", "1024") into megabytes,
/// i.e. milli-GB.
pub fn parse_memory(s: &str) -> Result<i64> {
    let (num, den) = parse_quantity(s)?;
    let bytes = ceil_div(num, den);
    to_i64(s, bytes / BYTES_PER_MEGABYTE)
}

/// Parse a storage request. Storage is kept on the same scale as memory.
pub fn parse_storage(s: &str) -> Result<i64> {
    parse_memory(s)
}

/// Parse a plain decimal count of display units (e.g. "3.75" GB or "4" cores)
/// into milli-units.
pub fn parse_display_units(s: &str) -> Result<i64> {
    let number = split_number(s)?;
    if !number.suffix.is_empty() {
        return Err(NodepackerError::invalid_quantity(
            s,
            "expected a plain decimal number",
        ));
    }
    let (num, den) = number.fraction();
    to_i64(s, ceil_div(checked_mul(s, num, MILLI)?, den))
}

/// Render milli-units in display units with up to three decimals and
/// trailing zeros trimmed: 3750 -> "3.75", 4000 -> "4".
pub fn format_units(milli: i64) -> String {
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.unsigned_abs();
    let whole = abs / 1000;
    let frac = abs % 1000;

    if frac == 0 {
        format!("{}{}", sign, whole)
    } else {
        let digits = format!("{:03}", frac);
        format!("{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

struct Number<'a> {
    negative: bool,
    mantissa: i128,
    frac_digits: u32,
    suffix: &'a str,
}

impl Number<'_> {
    fn fraction(&self) -> (i128, i128) {
        let num = if self.negative {
            -self.mantissa
        } else {
            self.mantissa
        };
        (num, 10i128.pow(self.frac_digits))
    }
}

fn split_number(s: &str) -> Result<Number<'_>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(NodepackerError::invalid_quantity(s, "empty quantity"));
    }

    let (negative, rest) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (numeric, suffix) = rest.split_at(end);

    let mut parts = numeric.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let frac = parts.next().unwrap_or_default();

    if frac.contains('.') {
        return Err(NodepackerError::invalid_quantity(s, "more than one decimal point"));
    }
    if whole.is_empty() && frac.is_empty() {
        return Err(NodepackerError::invalid_quantity(s, "missing numeric value"));
    }
    if whole.len() + frac.len() > MAX_MANTISSA_DIGITS {
        return Err(NodepackerError::invalid_quantity(s, "too many digits"));
    }

    let digits = format!("{}{}", whole, frac);
    let mantissa = digits
        .parse::<i128>()
        .map_err(|e| NodepackerError::invalid_quantity(s, e.to_string()))?;

    Ok(Number {
        negative,
        mantissa,
        frac_digits: frac.len() as u32,
        suffix,
    })
}

/// Parse a Kubernetes quantity into an exact fraction `(numerator, denominator)`
/// in base units.
fn parse_quantity(s: &str) -> Result<(i128, i128)> {
    let number = split_number(s)?;
    let (num, den) = number.fraction();
    let (mul, div) = suffix_multiplier(s, number.suffix)?;
    Ok((checked_mul(s, num, mul)?, checked_mul(s, den, div)?))
}

fn suffix_multiplier(s: &str, suffix: &str) -> Result<(i128, i128)> {
    const KI: i128 = 1024;

    let pair = match suffix {
        "" => (1, 1),
        "Ki" => (KI, 1),
        "Mi" => (KI.pow(2), 1),
        "Gi" => (KI.pow(3), 1),
        "Ti" => (KI.pow(4), 1),
        "Pi" => (KI.pow(5), 1),
        "Ei" => (KI.pow(6), 1),
        "n" => (1, 10i128.pow(9)),
        "u" => (1, 10i128.pow(6)),
        "m" => (1, 10i128.pow(3)),
        "k" => (10i128.pow(3), 1),
        "M" => (10i128.pow(6), 1),
        "G" => (10i128.pow(9), 1),
        "T" => (10i128.pow(12), 1),
        "P" => (10i128.pow(15), 1),
        "E" => (10i128.pow(18), 1),
        other if other.starts_with(['e', 'E']) => {
            let exponent: i32 = other[1..].parse().map_err(|_| {
                NodepackerError::invalid_quantity(s, format!("unknown suffix '{}'", other))
            })?;
            if exponent.unsigned_abs() > MAX_EXPONENT {
                return Err(NodepackerError::invalid_quantity(s, "exponent out of range"));
            }
            let scale = 10i128.pow(exponent.unsigned_abs());
            if exponent >= 0 {
                (scale, 1)
            } else {
                (1, scale)
            }
        }
        other => {
            return Err(NodepackerError::invalid_quantity(
                s,
                format!("unknown suffix '{}'", other),
            ))
        }
    };

    Ok(pair)
}

fn checked_mul(s: &str, a: i128, b: i128) -> Result<i128> {
    a.checked_mul(b)
        .ok_or_else(|| NodepackerError::invalid_quantity(s, "value out of range"))
}

fn ceil_div(num: i128, den: i128) -> i128 {
    let quotient = num.div_euclid(den);
    if num.rem_euclid(den) != 0 {
        quotient + 1
    } else {
        quotient
    }
}

fn to_i64(s: &str, value: i128) -> Result<i64> {
    i64::try_from(value).map_err(|_| NodepackerError::invalid_quantity(s, "value out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu() {
        assert_eq!(parse_cpu("1").unwrap(), 1000);
        assert_eq!(parse_cpu("0.5").unwrap(), 500);
        assert_eq!(parse_cpu("100m").unwrap(), 100);
        assert_eq!(parse_cpu("2").unwrap(), 2000);
        assert_eq!(parse_cpu("1.5").unwrap(), 1500);
    }

    #[test]
    fn test_parse_cpu_rounds_up() {
        assert_eq!(parse_cpu("0.0001").unwrap(), 1);
        assert_eq!(parse_cpu("1500u").unwrap(), 2);
    }

    #[test]
    fn test_parse_memory() {
        assert_eq!(parse_memory("100M").unwrap(), 100);
        assert_eq!(parse_memory("1G").unwrap(), 1000);
        assert_eq!(parse_memory("2Gi").unwrap(), 2147);
        assert_eq!(parse_memory("512Mi").unwrap(), 536);
        assert_eq!(parse_memory("1e9").unwrap(), 1000);
        assert_eq!(parse_memory("1024").unwrap(), 0);
    }

    #[test]
    fn test_parse_storage_matches_memory_scale() {
        assert_eq!(parse_storage("200Gi").unwrap(), 214748);
        assert_eq!(parse_storage("10G").unwrap(), 10000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_cpu("").is_err());
        assert!(parse_cpu("abc").is_err());
        assert!(parse_cpu("1.2.3").is_err());
        assert!(parse_memory("12xyz").is_err());
        assert!(parse_memory("1e99").is_err());
    }

    #[test]
    fn test_parse_display_units() {
        assert_eq!(parse_display_units("3.75").unwrap(), 3750);
        assert_eq!(parse_display_units("96").unwrap(), 96000);
        assert_eq!(parse_display_units("0.60").unwrap(), 600);
        assert!(parse_display_units("1Gi").is_err());
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(3750), "3.75");
        assert_eq!(format_units(4000), "4");
        assert_eq!(format_units(500), "0.5");
        assert_eq!(format_units(1), "0.001");
        assert_eq!(format_units(0), "0");
        assert_eq!(format_units(-1500), "-1.5");
    }
}
