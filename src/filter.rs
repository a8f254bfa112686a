use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::models::{JobPosting, Level};

/// Palette entry picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryChoice {
    All,
    Category(String),
}

impl CategoryChoice {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" => CategoryChoice::All,
            s if s.eq_ignore_ascii_case("all") => CategoryChoice::All,
            s => CategoryChoice::Category(s.to_string()),
        }
    }
}

/// Either every category, or a non-empty subset of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategorySelection {
    #[default]
    All,
    Subset(BTreeSet<String>),
}

impl CategorySelection {
    pub fn only(category: impl Into<String>) -> Self {
        CategorySelection::Subset(BTreeSet::from([category.into()]))
    }

    /// Builds a selection from a list, collapsing an empty list to `All`.
    pub fn from_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = categories.into_iter().map(Into::into).collect();
        if set.is_empty() {
            CategorySelection::All
        } else {
            CategorySelection::Subset(set)
        }
    }

    pub fn toggle(&mut self, choice: &CategoryChoice) {
        let category = match choice {
            CategoryChoice::All => {
                *self = CategorySelection::All;
                return;
            }
            CategoryChoice::Category(c) => c,
        };
        match self {
            CategorySelection::All => *self = CategorySelection::only(category.clone()),
            CategorySelection::Subset(set) => {
                if !set.remove(category) {
                    set.insert(category.clone());
                } else if set.is_empty() {
                    *self = CategorySelection::All;
                }
            }
        }
    }

    pub fn is_active(&self, choice: &CategoryChoice) -> bool {
        match (self, choice) {
            (CategorySelection::All, CategoryChoice::All) => true,
            (CategorySelection::Subset(set), CategoryChoice::Category(c)) => set.contains(c),
            _ => false,
        }
    }

    pub fn admits(&self, category: &str) -> bool {
        match self {
            CategorySelection::All => true,
            CategorySelection::Subset(set) => set.contains(category),
        }
    }
}

impl fmt::Display for CategorySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategorySelection::All => f.write_str("All"),
            CategorySelection::Subset(set) => {
                let names: Vec<&str> = set.iter().map(String::as_str).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

/// Exact-match dropdown value with an "Any" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Choice<T> {
    #[default]
    Any,
    Exact(T),
}

impl<T: PartialEq> Choice<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Choice::Any => true,
            Choice::Exact(wanted) => wanted == value,
        }
    }
}

impl<T> From<Option<T>> for Choice<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Choice::Any, Choice::Exact)
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Any => f.write_str("Any"),
            Choice::Exact(v) => write!(f, "{}", v),
        }
    }
}

/// Posting fields the keyword is searched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Company,
    Location,
    Category,
    Description,
}

impl SearchField {
    pub const ALL: [SearchField; 5] = [
        SearchField::Title,
        SearchField::Company,
        SearchField::Location,
        SearchField::Category,
        SearchField::Description,
    ];

    fn extract<'a>(&self, job: &'a JobPosting) -> &'a str {
        match self {
            SearchField::Title => &job.title,
            SearchField::Company => &job.company,
            SearchField::Location => &job.location,
            SearchField::Category => &job.category,
            SearchField::Description => &job.description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub categories: CategorySelection,
    pub level: Choice<Level>,
    pub location: Choice<String>,
    pub keyword: String,
}

impl FilterState {
    fn needle(&self) -> String {
        self.keyword.trim().to_lowercase()
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("category: {}", self.categories),
            format!("level: {}", self.level),
            format!("location: {}", self.location),
        ];
        if !self.keyword.trim().is_empty() {
            parts.push(format!("keyword: \"{}\"", self.keyword.trim()));
        }
        parts.join(" | ")
    }
}

fn matches(job: &JobPosting, filter: &FilterState, needle: &str, fields: &[SearchField]) -> bool {
    if !filter.categories.admits(&job.category) {
        return false;
    }
    if !filter.level.admits(&job.level) {
        return false;
    }
    if !filter.location.admits(&job.location) {
        return false;
    }
    if !needle.is_empty() {
        let hay = fields
            .iter()
            .map(|f| f.extract(job))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if !hay.contains(needle) {
            return false;
        }
    }
    true
}

/// Stable filter: matching postings in their original order.
pub fn match_postings<'a>(
    postings: &'a [JobPosting],
    filter: &FilterState,
    fields: &[SearchField],
) -> Vec<&'a JobPosting> {
    let needle = filter.needle();
    postings
        .iter()
        .filter(|job| matches(job, filter, &needle, fields))
        .collect()
}
