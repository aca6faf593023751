//! Numeric coercion of human-edited spreadsheet cells.
//!
//! Cells arrive as strings such as `"$1,250.50"`, `" 12 "`, `"n/a"` or `""`.
//! Coercion keeps only digits, `.` and `-`, then parses the longest numeric
//! prefix: an optional leading minus, integer digits, and an optional fraction.
//! A cell that yields no digits (or a non-finite value) does not coerce.

/// Coerce a raw cell to a finite number.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let prefix = numeric_prefix(&cleaned);
    if prefix.is_empty() {
        return None;
    }

    let v = prefix.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Coerce a raw cell, treating anything non-numeric as zero.
pub fn coerce_or_zero(raw: &str) -> f64 {
    coerce_numeric(raw).unwrap_or(0.0)
}

fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let len = bytes.len();

    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let int_digits = end - int_start;

    let mut frac_digits = 0;
    if end < len && bytes[end] == b'.' {
        let mut j = end + 1;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        frac_digits = j - end - 1;
        // A trailing bare `.` is not part of the number.
        if frac_digits > 0 {
            end = j;
        }
    }

    if int_digits + frac_digits == 0 {
        return "";
    }
    &s[..end]
}
