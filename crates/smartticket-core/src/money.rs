//! Peso amount parsing and display.

use serde_json::Value;

pub const CURRENCY_SYMBOL: &str = "₱";

/// Display an amount with grouped digits and up to three fraction digits.
///
/// `1234.5` → `₱1,234.5`, `1500` → `₱1,500`. Non-finite amounts render as `₱0.00`.
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{CURRENCY_SYMBOL}0.00");
    }
    let rounded = format!("{:.3}", amount.abs());
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (trimmed, None),
    };
    let negative = amount < 0.0 && trimmed != "0";

    let mut out = String::from(CURRENCY_SYMBOL);
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Display an amount with exactly two decimals and no grouping: `₱1234.50`.
///
/// Used for spreadsheet cells and history log payments.
pub fn format_amount_fixed(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    format!("{CURRENCY_SYMBOL}{amount:.2}")
}

/// Parse the leading numeric part of a string; anything unparsable is zero.
///
/// `"150"` → 150, `" 99.5 pesos"` → 99.5, `"abc"` → 0.
pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return 0.0;
    }
    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Read an amount stored as a JSON number, numeric string, or null.
pub fn amount_from_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_amount(s),
        _ => 0.0,
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_amount(1500.0), "₱1,500");
        assert_eq!(format_amount(1_234_567.0), "₱1,234,567");
        assert_eq!(format_amount(999.0), "₱999");
        assert_eq!(format_amount(0.0), "₱0");
    }

    #[test]
    fn keeps_up_to_three_fraction_digits() {
        assert_eq!(format_amount(1234.5), "₱1,234.5");
        assert_eq!(format_amount(10.125), "₱10.125");
        assert_eq!(format_amount(2.50), "₱2.5");
    }

    #[test]
    fn negative_amounts_keep_sign_after_symbol() {
        assert_eq!(format_amount(-2500.0), "₱-2,500");
    }

    #[test]
    fn nan_renders_as_zero() {
        assert_eq!(format_amount(f64::NAN), "₱0.00");
        assert_eq!(format_amount(f64::INFINITY), "₱0.00");
    }

    #[test]
    fn fixed_has_two_decimals() {
        assert_eq!(format_amount_fixed(1000.0), "₱1000.00");
        assert_eq!(format_amount_fixed(12.5), "₱12.50");
        assert_eq!(format_amount_fixed(f64::NAN), "₱0.00");
    }

    #[test]
    fn parse_takes_numeric_prefix() {
        assert_eq!(parse_amount("150"), 150.0);
        assert_eq!(parse_amount("  99.5 pesos"), 99.5);
        assert_eq!(parse_amount("-20"), -20.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("."), 0.0);
    }

    #[test]
    fn amount_from_json_values() {
        assert_eq!(amount_from_value(&json!(100)), 100.0);
        assert_eq!(amount_from_value(&json!(12.75)), 12.75);
        assert_eq!(amount_from_value(&json!("300")), 300.0);
        assert_eq!(amount_from_value(&json!(null)), 0.0);
        assert_eq!(amount_from_value(&json!(true)), 0.0);
    }
}
