//! Duration and timestamp parsing for cell values.
//!
//! Cells are free-form: a countdown may be typed as `120`, `02:00`,
//! `00:01:30`, or stored as a fraction of a day by the spreadsheet.
//! Nothing here returns an error; malformed input normalises to 0, which the
//! evaluator treats as "not started".

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A raw cell value as the store hands it over.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::from(s.as_str())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

/// Parse a countdown duration into whole seconds.
///
/// Accepted forms:
/// - integer text (`"120"`, `"-5"` clamps to 0)
/// - `MM:SS` and `HH:MM:SS` with digit-only parts
/// - numbers; a value in `(0, 2)` is a fraction of a day (`0.5` = 12h)
/// - decimal text goes through the numeric rule as well (`"0.5"` = 12h)
pub fn parse_seconds(value: impl Into<CellValue>) -> i64 {
    match value.into() {
        CellValue::Empty => 0,
        CellValue::Number(n) => seconds_from_number(n),
        CellValue::Text(s) => seconds_from_text(s.trim()),
    }
}

fn seconds_from_number(n: f64) -> i64 {
    if !n.is_finite() {
        return 0;
    }
    let secs = if n > 0.0 && n < 2.0 {
        (n * SECONDS_PER_DAY).round()
    } else {
        n.round()
    };
    if secs <= 0.0 {
        0
    } else if secs >= i64::MAX as f64 {
        i64::MAX
    } else {
        secs as i64
    }
}

fn seconds_from_text(s: &str) -> i64 {
    if s.is_empty() {
        return 0;
    }
    if is_signed_integer(s) {
        return s.parse::<i64>().map(|n| n.max(0)).unwrap_or(0);
    }

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() >= 2 {
        if !parts.iter().all(|p| is_digits(p)) {
            return 0;
        }
        let nums: Option<Vec<i64>> = parts.iter().map(|p| p.parse::<i64>().ok()).collect();
        return match nums.as_deref() {
            Some([m, sec]) => m.saturating_mul(60).saturating_add(*sec),
            Some([h, m, sec]) => h
                .saturating_mul(3600)
                .saturating_add(m.saturating_mul(60))
                .saturating_add(*sec),
            _ => 0,
        };
    }

    s.parse::<f64>().map(seconds_from_number).unwrap_or(0)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_signed_integer(s: &str) -> bool {
    is_digits(s.strip_prefix('-').unwrap_or(s))
}

/// Parse a stored epoch cell (`"1700000000"`, `"1700000000.0"`).
/// Empty or malformed input is 0 (not started).
pub fn parse_epoch(raw: &str) -> i64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0;
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => n.trunc() as i64,
        _ => 0,
    }
}

/// Format seconds as `HH:MM:SS` (negative clamps to zero).
pub fn fmt_hms(secs: i64) -> String {
    let secs = secs.max(0);
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}
