// lib/src/util.rs

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};

/// Rendered in place of any date that cannot be parsed.
pub const INVALID_DATE: &str = "Invalid Date";

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d %b %Y"];
const TIME_FORMATS: [&str; 3] = ["%H:%M", "%H:%M:%S", "%I:%M %p"];

/// Parses the date formats the seed data and forms use. RFC 3339 timestamps
/// are accepted and truncated to their date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS.iter().find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

/// Orders times of day chronologically. Times that do not parse go last,
/// in text order.
pub fn compare_times(a: &str, b: &str) -> Ordering {
    match (parse_time(a), parse_time(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn format_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => date.format("%d %b %Y").to_string(),
        None => INVALID_DATE.to_string(),
    }
}

/// Like `format_date`, but an absent value renders as a dash.
pub fn format_optional_date(raw: Option<&str>) -> String {
    raw.map(format_date).unwrap_or_else(|| "-".to_string())
}

/// Formats an amount with two decimals and thousands separators, e.g. `₹1,250.50`.
pub fn format_money(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{}{}.{}", sign, symbol, grouped, fraction)
}

/// Cuts `text` to at most `width` characters for fixed-width layouts.
pub fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= 1 {
        return text.chars().take(width).collect();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('~');
    cut
}
