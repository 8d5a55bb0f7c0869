use std::collections::{HashMap, HashSet};

/// Integral values below this magnitude render without a fractional part.
const INTEGRAL_RENDER_LIMIT: f64 = 1e15;

/// Renders a numeric cell the way spreadsheet exports usually show it.
///
/// # Examples
/// - `3.0` renders as `3`
/// - `2.5` renders as `2.5`
/// - `-0.0` renders as `0`
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.fract() == 0.0 && value.abs() < INTEGRAL_RENDER_LIMIT {
        // Normalises -0.0 as well
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Parses a delimited-text field as a number, accepting surrounding whitespace.
/// Non-finite spellings ("inf", "NaN") are left as text.
pub fn parse_number(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}

/// Makes header names unique by suffixing repeats with `.1`, `.2`, ...
/// The first occurrence keeps its name.
pub fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut result = Vec::with_capacity(headers.len());

    for header in headers {
        if used.insert(header.clone()) {
            result.push(header);
            continue;
        }

        let counter = counters.entry(header.clone()).or_insert(0);
        let candidate = loop {
            *counter += 1;
            let candidate = format!("{}.{}", header, counter);
            if used.insert(candidate.clone()) {
                break candidate;
            }
        };
        result.push(candidate);
    }

    result
}
