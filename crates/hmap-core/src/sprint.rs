use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Sprint {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Consecutive sprints of `length_days` starting at `start`.
pub fn default_sprints(start: NaiveDate, count: u32, length_days: u32) -> Vec<Sprint> {
    let length = i64::from(length_days.max(1));
    (0..count)
        .map(|i| {
            let offset = Duration::days(i64::from(i) * length);
            let sprint_start = start + offset;
            Sprint {
                id: format!("S{}", i + 1),
                name: format!("Sprint {}", i + 1),
                start_date: sprint_start,
                end_date: sprint_start + Duration::days(length - 1),
            }
        })
        .collect()
}

pub fn sprint_for(sprints: &[Sprint], date: NaiveDate) -> Option<&Sprint> {
    sprints.iter().find(|s| s.contains(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_two_week_sprints() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let sprints = default_sprints(start, 3, 14);
        assert_eq!(sprints.len(), 3);
        assert_eq!(sprints[0].end_date, NaiveDate::from_ymd_opt(2025, 1, 19).unwrap());
        assert_eq!(sprints[1].start_date, NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
        assert_eq!(sprints[2].id, "S3");
    }

    #[test]
    fn lookup_by_date() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let sprints = default_sprints(start, 3, 14);
        let d = NaiveDate::from_ymd_opt(2025, 1, 25).unwrap();
        assert_eq!(sprint_for(&sprints, d).unwrap().id, "S2");
        let outside = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(sprint_for(&sprints, outside).is_none());
    }
}
