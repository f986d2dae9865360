//! Profile extraction from rendered detail pages
//!
//! Every anchor on a profile page is optional. A missing element becomes an
//! empty string, never an error, so a partially rendered or restyled page
//! still produces a record.

use crate::config::SelectorSet;
use crate::crawler::fetcher::RenderedDocument;
use crate::record::{EducationEntry, ProfileRecord};
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

/// Extracts `ProfileRecord`s and applies the education country filter
#[derive(Debug, Clone)]
pub struct Extractor {
    selectors: Arc<SelectorSet>,
    target_country: String,
}

impl Extractor {
    pub fn new(selectors: Arc<SelectorSet>, target_country: impl Into<String>) -> Self {
        Self {
            selectors,
            target_country: target_country.into(),
        }
    }

    /// Extracts the records on one rendered detail page
    ///
    /// Returns no records when `source_url` is empty. Otherwise returns
    /// exactly one record, even if every field but the URL came back empty;
    /// dropping such records is left to downstream consumers.
    pub fn extract(&self, document: &RenderedDocument, source_url: &str) -> Vec<ProfileRecord> {
        if source_url.trim().is_empty() {
            return Vec::new();
        }

        let html = Html::parse_document(&document.html);
        let root = html.root_element();
        let selectors = &self.selectors;

        let educations = root
            .select(&selectors.education_entry)
            .map(|entry| EducationEntry {
                school: first_text(entry, &selectors.school),
                degree: first_text(entry, &selectors.degree),
                period: first_text(entry, &selectors.period),
            })
            .filter(|entry| entry.is_located_in(&self.target_country))
            .collect();

        let skills = root.select(&selectors.skill).map(element_text).collect();

        let record = ProfileRecord {
            name: first_text(root, &selectors.name),
            headline: first_text(root, &selectors.headline),
            location: first_text(root, &selectors.location),
            current_position: first_text(root, &selectors.current_position),
            educations,
            skills,
            profile_url: source_url.to_string(),
            scraped_at: Utc::now(),
        };

        vec![record]
    }
}

/// Text of the first element under `scope` matching `selector`, or ""
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// The element's own text nodes, nested elements excluded, with whitespace
/// runs collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .flat_map(|text| text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use url::Url;

    const PROFILE_URL: &str = "https://www.example.com/in/jane-doe";

    fn extractor() -> Extractor {
        let selectors = SelectorSet::compile(&SelectorConfig::default()).unwrap();
        Extractor::new(Arc::new(selectors), "France")
    }

    fn document(html: &str) -> RenderedDocument {
        RenderedDocument {
            url: Url::parse(PROFILE_URL).unwrap(),
            html: html.to_string(),
        }
    }

    fn education(school: &str, degree: &str, period: &str) -> String {
        format!(
            r#"<li class="education__list-item">
                <h3 class="pv-entity__school-name">{}</h3>
                <p class="pv-entity__degree-name"><span>{}</span></p>
                <p class="pv-entity__dates"><span>Dates attended</span><span>{}</span></p>
            </li>"#,
            school, degree, period
        )
    }

    fn profile_page(headline: bool, educations: &[String]) -> String {
        let headline = if headline {
            r#"<h2 class="mt1 t-18 t-black t-normal break-words">  Software   Engineer </h2>"#
        } else {
            ""
        };
        format!(
            r#"<html><body>
            <ul><li class="inline t-24 t-black t-normal break-words">
                Jane Doe
            </li></ul>
            {}
            <ul><li class="t-16 t-black t-normal inline-block">Paris, Île-de-France</li></ul>
            <section id="experience-section"><ul>
                <li class="pv-entity__position-group-pager">
                    <h3 class="t-16 t-black t-bold"><a href="/company/acme">Acme Corp</a></h3>
                </li>
            </ul></section>
            <section id="education-section"><ul>{}</ul></section>
            <section class="pv-skill-categories-section">
                <span class="pv-skill-category-entity__name-text"> Rust </span>
                <span class="pv-skill-category-entity__name-text">Python</span>
                <span class="pv-skill-category-entity__name-text">Rust</span>
            </section>
            </body></html>"#,
            headline,
            educations.join("\n")
        )
    }

    #[test]
    fn test_full_profile() {
        let html = profile_page(true, &[education("Sorbonne Université, France", "MSc", "2010 – 2012")]);
        let records = extractor().extract(&document(&html), PROFILE_URL);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.headline, "Software Engineer");
        assert_eq!(record.location, "Paris, Île-de-France");
        assert_eq!(record.current_position, "Acme Corp");
        assert_eq!(record.profile_url, PROFILE_URL);
        assert_eq!(record.educations.len(), 1);
        assert_eq!(record.educations[0].degree, "MSc");
        assert_eq!(record.educations[0].period, "2010 – 2012");
    }

    #[test]
    fn test_country_filter() {
        let html = profile_page(
            true,
            &[
                education("École Polytechnique, France", "BSc", "2008 – 2011"),
                education("MIT", "PhD", "2015-2019"),
                education("MIT", "Exchange", "2015-2019 France exchange"),
            ],
        );
        let record = extractor().extract(&document(&html), PROFILE_URL).remove(0);

        let schools: Vec<_> = record
            .educations
            .iter()
            .map(|e| (e.school.as_str(), e.period.as_str()))
            .collect();
        assert_eq!(
            schools,
            vec![
                ("École Polytechnique, France", "2008 – 2011"),
                ("MIT", "2015-2019 France exchange"),
            ]
        );
    }

    #[test]
    fn test_missing_headline_yields_empty_string() {
        let html = profile_page(false, &[education("HEC Paris, France", "MBA", "2019")]);
        let records = extractor().extract(&document(&html), PROFILE_URL);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.headline, "");
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.location, "Paris, Île-de-France");
        assert_eq!(record.current_position, "Acme Corp");
        assert_eq!(record.educations.len(), 1);
        assert_eq!(record.skills.len(), 3);
    }

    #[test]
    fn test_skills_keep_order_and_duplicates() {
        let html = profile_page(true, &[]);
        let record = extractor().extract(&document(&html), PROFILE_URL).remove(0);

        assert_eq!(record.skills, vec!["Rust", "Python", "Rust"]);
    }

    #[test]
    fn test_blank_skills_are_kept_in_place() {
        let html = r#"<section class="pv-skill-categories-section">
            <span class="pv-skill-category-entity__name-text">Rust</span>
            <span class="pv-skill-category-entity__name-text">   </span>
            <span class="pv-skill-category-entity__name-text">Go</span>
        </section>"#;
        let record = extractor().extract(&document(html), PROFILE_URL).remove(0);

        assert_eq!(record.skills, vec!["Rust", "", "Go"]);
    }

    #[test]
    fn test_nested_element_text_is_not_included() {
        let html = r#"<ul><li class="inline t-24 t-black t-normal break-words">
            Jane Doe <span class="pronouns">(She/Her)</span>
        </li></ul>"#;
        let record = extractor().extract(&document(html), PROFILE_URL).remove(0);

        assert_eq!(record.name, "Jane Doe");
    }

    #[test]
    fn test_empty_page_still_emits_bare_record() {
        let records = extractor().extract(&document("<html><body></body></html>"), PROFILE_URL);

        assert_eq!(records.len(), 1);
        assert!(records[0].is_bare());
        assert_eq!(records[0].profile_url, PROFILE_URL);
    }

    #[test]
    fn test_no_source_url_no_record() {
        let html = profile_page(true, &[]);
        assert!(extractor().extract(&document(&html), "").is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let html = profile_page(
            true,
            &[
                education("Université de Lyon, France", "MSc", "2001"),
                education("ETH Zürich", "PhD", "2005"),
            ],
        );
        let doc = document(&html);
        let first = extractor().extract(&doc, PROFILE_URL);
        let second = extractor().extract(&doc, PROFILE_URL);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert!(a.same_content(b));
        }
    }
}
