use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Like [`parse_date`], but `None` stays `None`.
pub(crate) fn parse_optional_date(date_str: Option<String>) -> Result<Option<NaiveDate>> {
    date_str.map(|s| parse_date(Some(s))).transpose()
}

/// Read one line from stdin after printing `label` to stderr.
pub(crate) fn prompt_line(label: &str) -> Result<String> {
    eprint!("{label}");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let line = line.trim().to_string();
    if line.is_empty() {
        bail!("No input");
    }
    Ok(line)
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

/// "750ml" below a litre, "1.5L" from there up.
pub(crate) fn format_water(ml: f64) -> String {
    if ml >= 1000.0 {
        format!("{:.1}L", ml / 1000.0)
    } else {
        format!("{:.0}ml", no_neg_zero(ml))
    }
}

pub(crate) fn format_duration(minutes: u32) -> String {
    let (hours, mins) = (minutes / 60, minutes % 60);
    match (hours, mins) {
        (0, m) => format!("{m}min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}min"),
    }
}

/// Quantities print without a trailing ".0" when whole.
pub(crate) fn format_quantity(q: f64) -> String {
    if q.fract() == 0.0 {
        format!("{:.0}", no_neg_zero(q))
    } else {
        format!("{q}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
        assert!(parse_date(Some("2024-13-01".to_string())).is_err());
    }

    #[test]
    fn test_parse_optional_date() {
        assert!(parse_optional_date(None).unwrap().is_none());
        assert_eq!(
            parse_optional_date(Some("2024-02-29".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(parse_optional_date(Some("soon".to_string())).is_err());
    }

    #[test]
    fn test_json_error_escapes() {
        assert_eq!(json_error("plain"), r#"{"error":"plain"}"#);
        assert_eq!(json_error("say \"hi\""), r#"{"error":"say \"hi\""}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
    }

    #[test]
    fn test_format_water() {
        assert_eq!(format_water(0.0), "0ml");
        assert_eq!(format_water(750.0), "750ml");
        assert_eq!(format_water(1000.0), "1.0L");
        assert_eq!(format_water(2500.0), "2.5L");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45min");
        assert_eq!(format_duration(60), "1h");
        assert_eq!(format_duration(95), "1h 35min");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(2.0), "2");
        assert_eq!(format_quantity(0.5), "0.5");
        assert_eq!(format_quantity(-0.0), "0");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
    }
}
