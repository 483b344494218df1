/// Two decimals plus unit, e.g. `110.00 TN`.
pub fn quantity(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{value:.2}")
    } else {
        format!("{value:.2} {unit}")
    }
}

/// Confidence range cell, e.g. `110.00 - 130.00 TN`.
pub fn range(lower: f64, upper: f64, unit: &str) -> String {
    format!("{lower:.2} - {}", quantity(upper, unit))
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
