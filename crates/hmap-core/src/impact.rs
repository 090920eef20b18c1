//! Schedule/cost impact strings such as `"+15d +5000c"`, and the change
//! requests and what-if scenarios that carry them.

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Impact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impact {
    pub days: i64,
    pub cost: i64,
}

static DAYS_RE: OnceLock<Regex> = OnceLock::new();
static COST_RE: OnceLock<Regex> = OnceLock::new();

fn days_re() -> &'static Regex {
    DAYS_RE.get_or_init(|| Regex::new(r"([+-]?\d+)d").unwrap())
}

fn cost_re() -> &'static Regex {
    COST_RE.get_or_init(|| Regex::new(r"([+-]?\d[\d,]*)c").unwrap())
}

/// Extract the day and cost deltas. A missing token is 0. When a token
/// appears more than once, the last occurrence wins.
pub fn parse_impact(text: &str) -> Impact {
    let last = |re: &Regex| {
        re.captures_iter(text)
            .filter_map(|c| c[1].replace(',', "").parse::<i64>().ok())
            .last()
            .unwrap_or(0)
    };
    Impact {
        days: last(days_re()),
        cost: last(cost_re()),
    }
}

impl Impact {
    pub fn is_zero(&self) -> bool {
        self.days == 0 && self.cost == 0
    }

    pub fn shift_date(&self, date: NaiveDate) -> NaiveDate {
        Duration::try_days(self.days)
            .and_then(|d| date.checked_add_signed(d))
            .unwrap_or(date)
    }

    pub fn adjust_budget(&self, budget: f64) -> f64 {
        budget + self.cost as f64
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}d {:+}c", self.days, self.cost)
    }
}

// ---------------------------------------------------------------------------
// ChangeRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ChangeRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeRequestStatus::Pending => "pending",
            ChangeRequestStatus::Approved => "approved",
            ChangeRequestStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Raw impact text as entered, e.g. `"+10d +2,500c"`.
    pub impact: String,
    #[serde(default)]
    pub status: ChangeRequestStatus,
}

impl ChangeRequest {
    pub fn parsed_impact(&self) -> Impact {
        parse_impact(&self.impact)
    }

    pub fn is_pending(&self) -> bool {
        self.status == ChangeRequestStatus::Pending
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioProjection {
    pub scenario: String,
    pub impact: Impact,
    pub end_date: NaiveDate,
    pub budget: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_days_and_cost() {
        assert_eq!(parse_impact("+15d +5000c"), Impact { days: 15, cost: 5000 });
        assert_eq!(parse_impact("-7d -1,000c"), Impact { days: -7, cost: -1000 });
        assert_eq!(parse_impact("no impact"), Impact { days: 0, cost: 0 });
    }

    #[test]
    fn each_token_is_optional() {
        assert_eq!(parse_impact("3d"), Impact { days: 3, cost: 0 });
        assert_eq!(parse_impact("12,500c"), Impact { days: 0, cost: 12500 });
        assert_eq!(parse_impact("+2500c +4d"), Impact { days: 4, cost: 2500 });
    }

    #[test]
    fn repeated_token_last_wins() {
        assert_eq!(parse_impact("+1d +2d"), Impact { days: 2, cost: 0 });
        assert_eq!(parse_impact("+100c then -50c"), Impact { days: 0, cost: -50 });
    }

    #[test]
    fn applies_to_date_and_budget() {
        let impact = parse_impact("+10d -500c");
        let date = NaiveDate::from_ymd_opt(2025, 1, 25).unwrap();
        assert_eq!(
            impact.shift_date(date),
            NaiveDate::from_ymd_opt(2025, 2, 4).unwrap()
        );
        assert_eq!(impact.adjust_budget(10_000.0), 9_500.0);
        assert_eq!(impact.to_string(), "+10d -500c");
    }
}
