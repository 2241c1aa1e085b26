/// Shown wherever a counter is absent from the API response.
pub const MISSING_PLACEHOLDER: &str = "N/A";

/// Integer count with `,` thousands separators. Negative values keep their
/// sign; the API reports negative deltas after data corrections.
pub fn format_count(value: Option<i64>) -> String {
    match value {
        Some(n) => group_thousands(n),
        None => MISSING_PLACEHOLDER.to_string(),
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Compact signed form for the info boxes: `+512`, `+1.2k`, `+3.4M`.
/// Missing reads as `+0`.
pub fn format_delta(value: Option<i64>) -> String {
    let n = value.unwrap_or(0);
    let sign = if n < 0 { '-' } else { '+' };
    let abs = n.unsigned_abs() as f64;
    let body = if abs >= 1_000_000_000.0 {
        format!("{:.1}B", abs / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.1}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", abs / 1_000.0)
    } else {
        format!("{}", abs as u64)
    };
    format!("{}{}", sign, body)
}
