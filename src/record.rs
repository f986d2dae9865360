//! Extracted profile records
//!
//! A `ProfileRecord` is built once by the extractor from a single rendered
//! detail page and handed to the output sinks unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One education entry that passed the country filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub period: String,
}

impl EducationEntry {
    /// Returns true if `country` appears in the school or the period text
    ///
    /// This is a loose substring check; "France" also matches
    /// "Ile-de-France" and nothing is case-folded.
    pub fn is_located_in(&self, country: &str) -> bool {
        self.school.contains(country) || self.period.contains(country)
    }
}

/// A structured profile extracted from one detail page
///
/// Text fields are never absent: a missing anchor on the page yields an empty
/// string, so consumers only ever need to check for emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,
    pub headline: String,
    pub location: String,
    pub current_position: String,
    pub educations: Vec<EducationEntry>,
    pub skills: Vec<String>,
    pub profile_url: String,
    pub scraped_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// Returns true if nothing besides the URL was extracted
    pub fn is_bare(&self) -> bool {
        self.name.is_empty()
            && self.headline.is_empty()
            && self.location.is_empty()
            && self.current_position.is_empty()
            && self.educations.is_empty()
            && self.skills.is_empty()
    }

    /// Compares everything except the scrape timestamp
    pub fn same_content(&self, other: &Self) -> bool {
        self.name == other.name
            && self.headline == other.headline
            && self.location == other.location
            && self.current_position == other.current_position
            && self.educations == other.educations
            && self.skills == other.skills
            && self.profile_url == other.profile_url
    }
}
