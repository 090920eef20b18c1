use crate::error::{HmapError, Result};
use crate::types::MilestoneHealth;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub name: String,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub health: MilestoneHealth,
    #[serde(default)]
    pub dependency: Option<String>,
}

impl Milestone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date: None,
            health: MilestoneHealth::OnTrack,
            dependency: None,
        }
    }

    /// True when the date has passed and the milestone is not already
    /// flagged as delayed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.date.is_some_and(|d| d < today) && self.health != MilestoneHealth::Delayed
    }
}

pub fn set_health(milestones: &mut [Milestone], id: &str, health: MilestoneHealth) -> Result<()> {
    let m = milestones
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or_else(|| HmapError::MilestoneNotFound(id.to_string()))?;
    m.health = health;
    Ok(())
}

/// Milestones sorted by date; undated ones last, in their original order.
pub fn by_date(milestones: &[Milestone]) -> Vec<&Milestone> {
    let mut sorted: Vec<&Milestone> = milestones.iter().collect();
    sorted.sort_by_key(|m| (m.date.is_none(), m.date));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn health_update() {
        let mut ms = vec![Milestone::new("M1", "Go live")];
        set_health(&mut ms, "M1", MilestoneHealth::AtRisk).unwrap();
        assert_eq!(ms[0].health, MilestoneHealth::AtRisk);
        assert!(set_health(&mut ms, "M2", MilestoneHealth::Delayed).is_err());
    }

    #[test]
    fn sorted_by_date_undated_last() {
        let mut a = Milestone::new("M1", "Late");
        a.date = Some(date(2025, 6, 1));
        let b = Milestone::new("M2", "Undated");
        let mut c = Milestone::new("M3", "Early");
        c.date = Some(date(2025, 2, 1));
        let ms = vec![a, b, c];
        let ids: Vec<&str> = by_date(&ms).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["M3", "M1", "M2"]);
    }

    #[test]
    fn overdue_detection() {
        let mut m = Milestone::new("M1", "Beta");
        m.date = Some(date(2025, 1, 1));
        assert!(m.is_overdue(date(2025, 1, 2)));
        assert!(!m.is_overdue(date(2024, 12, 31)));
        m.health = MilestoneHealth::Delayed;
        assert!(!m.is_overdue(date(2025, 1, 2)));
    }
}
