use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

// Dash-like separator (hyphen-minus, en-dash, em-dash), then "Month D, YYYY".
static FULL_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"[-\x{2013}\x{2014}]\s+",
        r"(((?i:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?",
        r"|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?))",
        r"\.?,?\s+(\d{1,2})[,.]?\s*(\d{4}))",
        r"\s*\z",
    ))
    .unwrap()
});

// "- 2010" / "– 2010" / "— 2010", or "(2005)", at the very end.
static YEAR_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[-\x{2013}\x{2014}]\s+((?:19|20)\d{2})|\(((?:19|20)\d{2})\))\s*\z").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateKind {
    Full,
    YearOnly,
}

impl DateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateKind::Full => "full",
            DateKind::YearOnly => "year-only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInfo {
    pub kind: DateKind,
    /// Date expression with internal whitespace collapsed, e.g. `September 30, 2025`.
    pub text: String,
    pub year: i32,
    /// Calendar date, only for full dates naming a real day.
    pub calendar: Option<NaiveDate>,
}

/// Classify the date expression that ends `span`, if any. Full dates take
/// precedence over year-only ones; an earlier year elsewhere in the span
/// is never picked up.
pub fn match_trailing(span: &str) -> Option<DateInfo> {
    if let Some(caps) = FULL_DATE_RE.captures(span) {
        return full_date(&caps);
    }
    let caps = YEAR_ONLY_RE.captures(span)?;
    let year = caps.get(1).or_else(|| caps.get(2))?.as_str();
    Some(DateInfo {
        kind: DateKind::YearOnly,
        text: year.to_string(),
        year: year.parse().ok()?,
        calendar: None,
    })
}

pub fn ends_with_date(span: &str) -> bool {
    FULL_DATE_RE.is_match(span) || YEAR_ONLY_RE.is_match(span)
}

fn full_date(caps: &Captures) -> Option<DateInfo> {
    let year: i32 = caps[4].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let calendar = month_number(&caps[2]).and_then(|m| NaiveDate::from_ymd_opt(year, m, day));
    Some(DateInfo {
        kind: DateKind::Full,
        text: caps[1].split_whitespace().collect::<Vec<_>>().join(" "),
        year,
        calendar,
    })
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: &[&str] = &[
        "jan", "feb", "mar", "apr", "may", "jun",
        "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix = name.get(..3)?.to_ascii_lowercase();
    MONTHS.iter().position(|m| *m == prefix).map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_date_with_hyphen() {
        let d = match_trailing("Theft at Acme Co. - January 5, 2019").unwrap();
        assert_eq!(d.kind, DateKind::Full);
        assert_eq!(d.year, 2019);
        assert_eq!(d.text, "January 5, 2019");
        assert_eq!(d.calendar, NaiveDate::from_ymd_opt(2019, 1, 5));
    }

    #[test]
    fn full_date_dash_variants() {
        for sep in ["-", "\u{2013}", "\u{2014}"] {
            let span = format!("Clerk pleads guilty {} March 12, 2024", sep);
            let d = match_trailing(&span).unwrap();
            assert_eq!(d.kind, DateKind::Full, "separator {:?}", sep);
        }
    }

    #[test]
    fn full_date_wrapped_and_abbreviated() {
        let d = match_trailing("Bookkeeper sentenced for fraud - Sept.\n30 2025  ").unwrap();
        assert_eq!(d.kind, DateKind::Full);
        assert_eq!(d.text, "Sept. 30 2025");
        assert_eq!(d.calendar, NaiveDate::from_ymd_opt(2025, 9, 30));

        let d = match_trailing("Title - Jan 1, 2020").unwrap();
        assert_eq!(d.year, 2020);
    }

    #[test]
    fn impossible_day_keeps_full_kind() {
        let d = match_trailing("Manager charged - February 30, 2021").unwrap();
        assert_eq!(d.kind, DateKind::Full);
        assert_eq!(d.year, 2021);
        assert!(d.calendar.is_none());
    }

    #[test]
    fn year_only_parenthesized() {
        let d = match_trailing("Former treasurer admits embezzlement (2011)").unwrap();
        assert_eq!(d.kind, DateKind::YearOnly);
        assert_eq!(d.year, 2011);
        assert_eq!(d.text, "2011");
    }

    #[test]
    fn year_only_after_dash() {
        let d = match_trailing("Payroll clerk diverted funds \u{2013} 2010").unwrap();
        assert_eq!(d.kind, DateKind::YearOnly);
        assert_eq!(d.year, 2010);
    }

    #[test]
    fn anchored_to_end() {
        assert!(match_trailing("In 2019 - 2020 the employee was fired for misconduct").is_none());
        assert!(match_trailing("Charged - January 5, 2019 after an audit").is_none());
        assert!(match_trailing("Employee number (2011) took cash").is_none());
    }

    #[test]
    fn no_separator_no_date() {
        assert!(match_trailing("Employee stole $40,000 January 5, 2019").is_none());
        assert!(match_trailing("Employee stole 2019").is_none());
        assert!(!ends_with_date("BANKING / FINANCIAL INSTITUTIONS"));
    }
}
