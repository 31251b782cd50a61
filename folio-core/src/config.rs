use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("base URL is not set")]
    MissingBaseUrl,
    #[error("invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("no domain configured and base URL `{0}` has no host")]
    MissingDomain(String),
    #[error("{kind} directory not found: {}", path.display())]
    MissingSourceDir { kind: &'static str, path: PathBuf },
    #[error("template `{name}` not found in {}", dir.display())]
    MissingTemplate { name: &'static str, dir: PathBuf },
}

/// Everything a build needs to know about where things live.
///
/// The defaults are the production layout; tests point every path at a
/// temporary directory instead.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    /// Output root, wiped and recreated on every build
    pub output_dir: PathBuf,
    /// Asset tree copied to `<output>/static`
    pub static_dir: PathBuf,
    /// Pre-built sub-sites merged onto the output root
    pub standalone_dir: PathBuf,
    /// Subdirectory of the standalone tree scanned for sitemap entries
    pub projects_subdir: PathBuf,
    /// Tera templates, one per page
    pub templates_dir: PathBuf,
    /// TOML file holding the portfolio content
    pub content_file: PathBuf,
    /// Canonical site URL used for sitemap entries
    pub base_url: String,
    /// Hostname written to CNAME. Derived from `base_url` when unset.
    pub domain: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("docs"),
            static_dir: PathBuf::from("static"),
            standalone_dir: PathBuf::from("static_pages"),
            projects_subdir: PathBuf::from("projects"),
            templates_dir: PathBuf::from("templates"),
            content_file: PathBuf::from("content.toml"),
            base_url: String::new(),
            domain: None,
        }
    }
}

impl BuildConfig {
    /// Point every source path and the output path below `root`.
    pub fn rooted_at<P: AsRef<Path>>(mut self, root: P) -> Self {
        let root = root.as_ref();
        self.output_dir = root.join(&self.output_dir);
        self.static_dir = root.join(&self.static_dir);
        self.standalone_dir = root.join(&self.standalone_dir);
        self.templates_dir = root.join(&self.templates_dir);
        self.content_file = root.join(&self.content_file);
        self
    }

    /// Checks everything that can be known before the output root is touched.
    ///
    /// A build that is doomed anyway must not destroy the previous output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url()?;
        self.cname()?;

        let required = [
            ("static", &self.static_dir),
            ("standalone", &self.standalone_dir),
            ("templates", &self.templates_dir),
        ];
        for (kind, path) in required {
            if !path.is_dir() {
                return Err(ConfigError::MissingSourceDir {
                    kind,
                    path: path.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.base_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }

        Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            source,
        })
    }

    /// Hostname for the domain-pinning file.
    pub fn cname(&self) -> Result<String, ConfigError> {
        if let Some(domain) = self.domain.as_deref().map(str::trim) {
            if !domain.is_empty() {
                return Ok(domain.to_string());
            }
        }

        let url = self.parsed_base_url()?;
        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingDomain(self.base_url.clone()))
    }
}
