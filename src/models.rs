use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

pub type JobId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Internship,
    Junior,
    Mid,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Internship, Level::Junior, Level::Mid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Internship => "Internship",
            Level::Junior => "Junior",
            Level::Mid => "Mid",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BoardError::UnknownLevel(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub category: String, // "IT", "Business", "Design", ...
    pub location: String, // "Windhoek", "Swakopmund", "Remote", ...
    pub level: Level,
    #[serde(alias = "desc", default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// Employer-submitted fields, before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingDraft {
    pub title: String,
    pub company: String,
    pub category: String,
    pub location: String,
    pub level: Option<Level>,
    pub description: String,
}

impl PostingDraft {
    /// Names of required fields left blank. Location is not required.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.company.trim().is_empty() {
            missing.push("company");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if self.level.is_none() {
            missing.push("level");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        missing
    }
}

pub const CATEGORY_PALETTE: [&str; 5] = ["IT", "Business", "Design", "Engineering", "Finance"];

pub const LOCATIONS: [&str; 3] = ["Windhoek", "Swakopmund", "Remote"];

fn seed(
    id: JobId,
    title: &str,
    company: &str,
    category: &str,
    location: &str,
    level: Level,
    description: &str,
) -> JobPosting {
    JobPosting {
        id,
        title: title.to_string(),
        company: company.to_string(),
        category: category.to_string(),
        location: location.to_string(),
        level,
        description: description.to_string(),
        duration: None,
    }
}

pub fn seed_postings() -> Vec<JobPosting> {
    use Level::*;
    vec![
        seed(1, "Junior Web Developer", "Tech Solutions Namibia", "IT", "Windhoek", Junior, "Frontend + basic backend. Good for web dev grads."),
        seed(2, "Marketing Intern", "Namibia Business Hub", "Business", "Remote", Internship, "Assist with campaigns and analytics."),
        seed(3, "Data Analyst (Entry)", "Insight Labs", "IT", "Windhoek", Junior, "Work with Python and Excel to generate reports."),
        seed(4, "Civil Engineering Assistant", "BuildCo", "Engineering", "Swakopmund", Mid, "Support site planning and drafting."),
        seed(5, "Junior Accountant", "AccountsPlus", "Finance", "Windhoek", Junior, "Assist with bookkeeping and payroll."),
        seed(6, "Graphic Designer (Remote)", "Brandmakers", "Design", "Remote", Internship, "Create social assets and UI mockups."),
        seed(7, "Frontend Engineer (React)", "WebWorks", "IT", "Windhoek", Mid, "React + modern frontend stack."),
        seed(8, "Business Analyst (Junior)", "ConsultCo", "Business", "Windhoek", Junior, "Assist with client reports and dashboards."),
        seed(9, "UX Designer", "Pixel Labs", "Design", "Swakopmund", Junior, "Wireframing and prototype testing."),
        seed(10, "IT Support Intern", "Campus IT", "IT", "Windhoek", Internship, "Helpdesk, basic networking and support."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_ids_are_unique() {
        let seeds = seed_postings();
        let mut ids: Vec<JobId> = seeds.iter().map(|j| j.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), seeds.len());
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("mid".parse::<Level>().unwrap(), Level::Mid);
        assert_eq!(" Internship ".parse::<Level>().unwrap(), Level::Internship);
        assert!("Senior".parse::<Level>().is_err());
    }

    #[test]
    fn posting_accepts_legacy_desc_field() {
        let raw = r#"{"id":1,"title":"t","company":"c","category":"IT","location":"Remote","level":"Junior","desc":"d"}"#;
        let job: JobPosting = serde_json::from_str(raw).unwrap();
        assert_eq!(job.description, "d");
        assert_eq!(job.duration, None);
    }

    #[test]
    fn draft_reports_missing_fields_but_not_location() {
        let draft = PostingDraft {
            title: "QA Tester".into(),
            company: "  ".into(),
            category: "IT".into(),
            location: String::new(),
            level: None,
            description: "test".into(),
        };
        assert_eq!(draft.missing_fields(), vec!["company", "level"]);
    }
}
