use crate::models::MetricValue;
use serde::Serialize;

/// Qualitative status of a value against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Neutral,
    Pass,
    Fail,
}

/// Render a metric value with two decimals. Missing values become `N/A`;
/// text that does not parse is passed through unchanged.
pub fn format_value(value: Option<&MetricValue>) -> String {
    match value {
        None => "N/A".to_string(),
        Some(MetricValue::Text(text)) => match value.and_then(MetricValue::as_f64) {
            Some(n) => format_number(n),
            None => text.clone(),
        },
        Some(MetricValue::Float(n)) => format_number(*n),
    }
}

/// Two-decimal rendering that rounds the exact binary value half away from
/// zero, as `Number.prototype.toFixed(2)` does. `{:.2}` alone rounds exact
/// ties to even (`0.125` would print as `0.12`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".into() } else { "-Infinity".into() };
    }

    // 1074 fractional digits is enough to print any f64 exactly.
    let exact = format!("{:.1074}", n.abs());
    let (int_part, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let frac = frac.as_bytes();

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac.iter().copied().take(2))
        .map(|b| b - b'0')
        .collect();
    if frac.get(2).is_some_and(|d| *d >= b'5') {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - 2;
    let mut out = String::with_capacity(digits.len() + 2);
    // Negative zero is not below zero, so it prints unsigned.
    if n < 0.0 {
        out.push('-');
    }
    out.extend(digits[..split].iter().map(|d| char::from(b'0' + d)));
    out.push('.');
    out.extend(digits[split..].iter().map(|d| char::from(b'0' + d)));
    out
}

pub fn classify(value: Option<&MetricValue>, threshold: f64) -> Status {
    match value.and_then(MetricValue::as_f64) {
        None => Status::Neutral,
        Some(n) if n <= threshold => Status::Pass,
        Some(_) => Status::Fail,
    }
}
