use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::route::SitePage;

/// The data handed to a template. Opaque to everything but the renderer.
pub type ContentRecord = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parsing(#[from] toml::de::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Portfolio {
    pub bio: Bio,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    /// Skill group name to skills, in declaration order
    pub skills: IndexMap<String, Vec<String>>,
    pub projects: Vec<Project>,
    pub apps: Apps,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Bio {
    pub name: String,
    pub role: String,
    pub location: String,
    pub email: String,
    pub linkedin: String,
    pub github: String,
    pub text: String,
    pub hobbies: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Experience {
    pub role: String,
    pub company: String,
    pub date: String,
    pub details: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Education {
    pub degree: String,
    pub school: String,
    pub year: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub name: String,
    pub tag: String,
    pub desc: String,
    #[serde(default = "default_link")]
    pub link: String,
}

fn default_link() -> String {
    "#".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Apps {
    pub android: Vec<Project>,
    pub ios: Vec<Project>,
}

impl Portfolio {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ContentError> {
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, ContentError> {
        Ok(toml::from_str(data)?)
    }

    /// The record a page's template is rendered with.
    pub fn record_for(&self, page: SitePage) -> Result<ContentRecord, ContentError> {
        let mut record = ContentRecord::new();
        record.insert("title".into(), Value::from(page.title()));

        match page {
            SitePage::Home => {
                record.insert("bio".into(), serde_json::to_value(&self.bio)?);
                record.insert("experience".into(), serde_json::to_value(&self.experience)?);
                record.insert("education".into(), serde_json::to_value(&self.education)?);
                record.insert("skills".into(), serde_json::to_value(&self.skills)?);
            }
            SitePage::Projects => {
                record.insert("projects".into(), serde_json::to_value(&self.projects)?);
            }
            SitePage::Apps => {
                record.insert("apps".into(), serde_json::to_value(&self.apps)?);
            }
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
[bio]
name = "Ada"
role = "Engineer"
hobbies = ["chess"]

[[experience]]
role = "Validation Engineer"
company = "Acme"
date = "2020 - Present"
details = "Built things."

[skills]
Languages = ["Rust", "C"]
Tools = ["Git"]

[[projects]]
name = "Pantheon"
tag = "Hardware"
desc = "Stress testing."

[[apps.android]]
name = "SoundCanvas"
tag = "Android Native"
desc = "Audio."
link = "https://example.com/soundcanvas"
"##;

    #[test]
    fn test_parse_portfolio() {
        let portfolio = Portfolio::parse(SAMPLE).unwrap();
        assert_eq!(portfolio.bio.name, "Ada");
        assert_eq!(portfolio.bio.hobbies, vec!["chess"]);
        assert_eq!(portfolio.experience.len(), 1);
        assert!(portfolio.education.is_empty());
        assert_eq!(portfolio.projects[0].link, "#");
        assert_eq!(portfolio.apps.android[0].name, "SoundCanvas");
        assert!(portfolio.apps.ios.is_empty());
    }

    #[test]
    fn test_skill_groups_keep_declared_order() {
        let portfolio =
            Portfolio::parse("[skills]\nTools = [\"Git\"]\nLanguages = [\"C\"]\n").unwrap();
        let groups: Vec<&str> = portfolio.skills.keys().map(String::as_str).collect();
        assert_eq!(groups, vec!["Tools", "Languages"]);
    }

    #[test]
    fn test_record_for_each_page() {
        let portfolio = Portfolio::parse(SAMPLE).unwrap();

        let home = portfolio.record_for(SitePage::Home).unwrap();
        assert_eq!(home["title"], "About Me");
        assert_eq!(home["bio"]["name"], "Ada");
        assert_eq!(home["skills"]["Languages"][0], "Rust");
        assert!(!home.contains_key("projects"));

        let projects = portfolio.record_for(SitePage::Projects).unwrap();
        assert_eq!(projects["title"], "Projects");
        assert_eq!(projects["projects"][0]["name"], "Pantheon");

        let apps = portfolio.record_for(SitePage::Apps).unwrap();
        assert_eq!(apps["apps"]["android"][0]["tag"], "Android Native");
        assert_eq!(apps["apps"]["ios"], Value::Array(vec![]));
    }

    #[test]
    fn test_malformed_content() {
        assert!(matches!(
            Portfolio::parse("[bio\nname = 1"),
            Err(ContentError::Parsing(_))
        ));
    }
}
