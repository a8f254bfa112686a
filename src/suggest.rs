use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const NO_SUGGESTION: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub completed_courses: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Jane Doe".to_string(),
            completed_courses: vec![
                "Web Development Basics".to_string(),
                "Digital Marketing Fundamentals".to_string(),
                "Data Analysis with Python".to_string(),
            ],
        }
    }
}

/// Course name to job category lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCatalog(pub HashMap<String, String>);

impl Default for CourseCatalog {
    fn default() -> Self {
        let pairs = [
            ("Web Development Basics", "IT"),
            ("Digital Marketing Fundamentals", "Business"),
            ("Data Analysis with Python", "IT"),
            ("Business Communication", "Business"),
            ("Engineering Essentials", "Engineering"),
        ];
        Self(
            pairs
                .into_iter()
                .map(|(course, cat)| (course.to_string(), cat.to_string()))
                .collect(),
        )
    }
}

impl CourseCatalog {
    pub fn category_for(&self, course: &str) -> Option<&str> {
        self.0.get(course).map(String::as_str)
    }
}

/// First category implied by the profile's courses, in course order.
pub fn suggest_category<'a>(profile: &UserProfile, catalog: &'a CourseCatalog) -> Option<&'a str> {
    profile
        .completed_courses
        .iter()
        .find_map(|course| catalog.category_for(course))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_suggests_it() {
        let catalog = CourseCatalog::default();
        let got = suggest_category(&UserProfile::default(), &catalog);
        assert_eq!(got, Some("IT"));
    }

    #[test]
    fn unknown_courses_are_skipped() {
        let profile = UserProfile {
            name: "Sam".into(),
            completed_courses: vec!["Pottery".into(), "Engineering Essentials".into()],
        };
        let catalog = CourseCatalog::default();
        let got = suggest_category(&profile, &catalog);
        assert_eq!(got, Some("Engineering"));
    }

    #[test]
    fn no_mapped_course_means_no_suggestion() {
        let profile = UserProfile {
            name: "Sam".into(),
            completed_courses: vec!["Pottery".into()],
        };
        let catalog = CourseCatalog::default();
        assert_eq!(suggest_category(&profile, &catalog), None);
    }
}
