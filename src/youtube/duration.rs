// Duration labels for catalog items.
//
// The Data API reports durations as ISO 8601 ("PT4M13S"), yt-dlp reports
// whole seconds. Both end up as the same display label: "4:13" or "1:02:05".

const FALLBACK_LABEL: &str = "0:00";

/// Parses an ISO 8601 duration such as `PT1H2M5S` or `P1DT3M` into seconds.
///
/// Only the designators YouTube emits are accepted (weeks, days, hours,
/// minutes, seconds), and they must appear in that order.
pub fn parse_iso8601(input: &str) -> Option<u64> {
    let rest = input.trim().strip_prefix('P')?;

    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    if date_part.is_empty() && time_part.map_or(true, str::is_empty) {
        return None;
    }

    let mut total = sum_components(date_part, &[('W', 604_800), ('D', 86_400)])?;
    if let Some(time) = time_part {
        if time.is_empty() {
            return None;
        }
        total = total.checked_add(sum_components(time, &[('H', 3_600), ('M', 60), ('S', 1)])?)?;
    }

    Some(total)
}

// Adds up "<digits><unit>" runs, e.g. "4M13S". Units must follow the order
// given in `units` and each may appear at most once.
fn sum_components(part: &str, units: &[(char, u64)]) -> Option<u64> {
    let mut total: u64 = 0;
    let mut digits = String::new();
    let mut remaining_units = units.iter();

    for ch in part.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        if digits.is_empty() {
            return None;
        }
        let (_, scale) = remaining_units.by_ref().find(|(unit, _)| *unit == ch)?;
        let value: u64 = digits.parse().ok()?;
        total = total.checked_add(value.checked_mul(*scale)?)?;
        digits.clear();
    }

    // Trailing digits without a designator
    if !digits.is_empty() {
        return None;
    }

    Some(total)
}

/// Formats seconds as `m:ss`, or `h:mm:ss` once the duration reaches an hour.
pub fn format_seconds(total_seconds: u64) -> String {
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Converts an ISO 8601 duration straight into a display label.
/// Anything unparseable becomes "0:00".
pub fn label_from_iso8601(input: &str) -> String {
    match parse_iso8601(input) {
        Some(seconds) => format_seconds(seconds),
        None => FALLBACK_LABEL.to_string(),
    }
}
