//! Loose value coercions used when reading payloads.
//!
//! Gateways are not strict about scalar types: an `int` field may arrive as
//! `"42"`, a `bool` as `1`. These helpers apply the same rules the console
//! has always applied so that stored configurations keep loading.

use serde_json::Value;

/// Value stored for an `int` field that cannot be parsed.
pub const INVALID_INT: i64 = -1;

/// Truthiness of a payload value: `null`, `false`, `0` and `""` are false,
/// everything else (including empty arrays and objects) is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a payload value, used for `nested_enum` choice keys.
///
/// Falsy values collapse to the empty string; other scalars keep their JSON
/// text (`5` → `"5"`).
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other if !truthy(other) => String::new(),
        other => other.to_string(),
    }
}

/// Base-10 integer parse with a `-1` fallback.
///
/// Numbers are truncated toward zero. Strings follow prefix parsing: leading
/// whitespace, an optional sign, then as many digits as are present
/// (`"42abc"` → 42). Anything without a leading digit is invalid.
pub fn parse_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(INVALID_INT),
        Value::String(s) => parse_int_prefix(s).unwrap_or(INVALID_INT),
        _ => INVALID_INT,
    }
}

fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let magnitude = rest[..digits].bytes().fold(0_i64, |acc, d| {
        acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}
