use crate::config::types::SelectorConfig;
use crate::ConfigError;
use scraper::Selector;

/// Compiled form of `SelectorConfig`
///
/// Compiled once after the configuration is loaded and shared read-only by
/// every worker.
#[derive(Debug, Clone)]
pub struct SelectorSet {
    pub result_list: Selector,
    pub result_entry: Selector,
    pub profile_link: Selector,
    pub next_button: Selector,
    pub name: Selector,
    pub headline: Selector,
    pub location: Selector,
    pub current_position: Selector,
    pub education_entry: Selector,
    pub school: Selector,
    pub degree: Selector,
    pub period: Selector,
    pub skill: Selector,
    /// The selector strings these were compiled from
    pub source: SelectorConfig,
}

impl SelectorSet {
    /// Compiles every selector, failing on the first one that does not parse
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            result_list: parse("result-list", &config.result_list)?,
            result_entry: parse("result-entry", &config.result_entry)?,
            profile_link: parse("profile-link", &config.profile_link)?,
            next_button: parse("next-button", &config.next_button)?,
            name: parse("name", &config.name)?,
            headline: parse("headline", &config.headline)?,
            location: parse("location", &config.location)?,
            current_position: parse("current-position", &config.current_position)?,
            education_entry: parse("education-entry", &config.education_entry)?,
            school: parse("school", &config.school)?,
            degree: parse("degree", &config.degree)?,
            period: parse("period", &config.period)?,
            skill: parse("skill", &config.skill)?,
            source: config.clone(),
        })
    }
}

fn parse(name: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        name: name.to_string(),
        selector: selector.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selectors_compile() {
        assert!(SelectorSet::compile(&SelectorConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_selector_is_named() {
        let config = SelectorConfig {
            skill: "span[[".to_string(),
            ..SelectorConfig::default()
        };

        match SelectorSet::compile(&config) {
            Err(ConfigError::InvalidSelector { name, selector }) => {
                assert_eq!(name, "skill");
                assert_eq!(selector, "span[[");
            }
            other => panic!("expected InvalidSelector, got {:?}", other),
        }
    }
}
