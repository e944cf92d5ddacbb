//! Display formatting for money, dates and elapsed time (en-IN conventions).

use time::format_description::StaticFormatDescription;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const DISPLAY_DATE: StaticFormatDescription = format_description!("[day padding:none] [month repr:short] [year]");
const CHART_LABEL: StaticFormatDescription = format_description!("[month repr:short] [day padding:none]");

/// Formats an amount in rupees with Indian digit grouping: `₹1,23,456.78`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_currency(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let paise = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && paise > 0 { "-" } else { "" };
    format!("{sign}₹{}.{:02}", group_indian(paise / 100), paise % 100)
}

fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// `16 Oct 2026`
#[must_use]
pub fn format_date(date: Date) -> String {
    date.format(DISPLAY_DATE).unwrap_or_else(|_| date.to_string())
}

/// Formats a date string from the API, echoing it back unchanged when it does not parse.
#[must_use]
pub fn format_date_str(raw: &str) -> String {
    crate::domain::de::parse_date(raw).map_or_else(|_| raw.to_string(), format_date)
}

/// Short chart axis label: `Oct 16`.
#[must_use]
pub fn format_chart_label(date: Date) -> String {
    date.format(CHART_LABEL).unwrap_or_else(|_| date.to_string())
}

/// Humanizes the time elapsed between `then` and `now`; a week or more shows the date.
#[must_use]
pub fn format_relative_time(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let elapsed = now - then;
    let minutes = elapsed.whole_minutes();
    let hours = elapsed.whole_hours();
    let days = elapsed.whole_days();

    let plural = |n: i64| if n > 1 { "s" } else { "" };

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} minute{} ago", plural(minutes))
    } else if hours < 24 {
        format!("{hours} hour{} ago", plural(hours))
    } else if days < 7 {
        format!("{days} day{} ago", plural(days))
    } else {
        format_date(then.date())
    }
}
