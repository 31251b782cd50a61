use std::fmt;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use thiserror::Error;

use crate::config::{BuildConfig, ConfigError};
use crate::content::{ContentError, Portfolio};
use crate::merge::{self, MergeError, MergeSource};
use crate::render::{PageRenderer, RenderError, TemplateRenderer};
use crate::route::{Route, SitePage, routes};
use crate::sitemap::{SitemapError, SitemapGenerator, write_sitemap};

pub const CNAME_FILE: &str = "CNAME";
pub const ASSETS_DEST: &str = "static";

/// Build progress. Strictly linear; a fatal failure stops the build in the
/// phase it was entering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    RootWiped,
    AssetsCopied,
    StandaloneCopied,
    PagesRendered,
    DomainPinned,
    SitemapWritten,
    Done,
}

impl BuildPhase {
    pub fn next(self) -> Self {
        match self {
            BuildPhase::Idle => BuildPhase::RootWiped,
            BuildPhase::RootWiped => BuildPhase::AssetsCopied,
            BuildPhase::AssetsCopied => BuildPhase::StandaloneCopied,
            BuildPhase::StandaloneCopied => BuildPhase::PagesRendered,
            BuildPhase::PagesRendered => BuildPhase::DomainPinned,
            BuildPhase::DomainPinned => BuildPhase::SitemapWritten,
            BuildPhase::SitemapWritten | BuildPhase::Done => BuildPhase::Done,
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::Idle => "idle",
            BuildPhase::RootWiped => "wipe output root",
            BuildPhase::AssetsCopied => "copy assets",
            BuildPhase::StandaloneCopied => "copy standalone projects",
            BuildPhase::PagesRendered => "render pages",
            BuildPhase::DomainPinned => "write CNAME",
            BuildPhase::SitemapWritten => "write sitemap",
            BuildPhase::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("failed to load templates: {0}")]
    Templates(#[from] RenderError),
    #[error("renderer not specified")]
    MissingRenderer,
    #[error("build failed during `{phase}`: {source}")]
    Merge {
        phase: BuildPhase,
        source: MergeError,
    },
    #[error("build failed during `{phase}` at {}: {source}", path.display())]
    Io {
        phase: BuildPhase,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl BuildError {
    /// The phase a fatal error stopped in, if it got past validation.
    pub fn phase(&self) -> Option<BuildPhase> {
        match self {
            BuildError::Merge { phase, .. } | BuildError::Io { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct PageFailure {
    pub page: SitePage,
    pub error: String,
}

/// What a finished build produced. Non-fatal failures end up here instead of
/// aborting the build.
#[derive(Debug)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub files_copied: usize,
    pub pages_rendered: Vec<PathBuf>,
    pub failed_pages: Vec<PageFailure>,
    pub sitemap: Option<PathBuf>,
    pub phase: BuildPhase,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failed_pages.is_empty() && self.sitemap.is_some()
    }
}

pub struct SiteBuilder {
    config: BuildConfig,
    portfolio: Portfolio,
    renderer: Option<Box<dyn PageRenderer>>,
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self {
            config: BuildConfig::default(),
            portfolio: Portfolio::default(),
            renderer: None,
        }
    }

    pub fn config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    pub fn portfolio(mut self, portfolio: Portfolio) -> Self {
        self.portfolio = portfolio;
        self
    }

    pub fn renderer<R: PageRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Validates the configuration. Nothing on disk is touched until
    /// [`Site::build`] runs.
    pub fn build(self) -> Result<Site, BuildError> {
        self.config.validate()?;
        let renderer = self.renderer.ok_or(BuildError::MissingRenderer)?;
        let cname = self.config.cname()?;

        Ok(Site {
            config: self.config,
            portfolio: self.portfolio,
            renderer,
            cname,
        })
    }
}

pub struct Site {
    config: BuildConfig,
    portfolio: Portfolio,
    renderer: Box<dyn PageRenderer>,
    cname: String,
}

impl Site {
    pub fn routes(&self) -> Vec<Route> {
        routes()
    }

    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let output_dir = &self.config.output_dir;
        let mut phase = BuildPhase::Idle;
        let mut report = BuildReport {
            output_dir: output_dir.clone(),
            files_copied: 0,
            pages_rendered: Vec::new(),
            failed_pages: Vec::new(),
            sitemap: None,
            phase,
        };

        phase = phase.next();
        info!(target: "build", "Cleaning {}", output_dir.display());
        merge::merge_into(output_dir, &[MergeSource::replace_root()])
            .map_err(|source| BuildError::Merge { phase, source })?;

        phase = phase.next();
        info!(target: "build", "Copying static files from {}", self.config.static_dir.display());
        let stats = merge::merge_into(
            output_dir,
            &[MergeSource::copy_tree(&self.config.static_dir, ASSETS_DEST)],
        )
        .map_err(|source| BuildError::Merge { phase, source })?;
        report.files_copied += stats.files;

        phase = phase.next();
        info!(
            target: "build",
            "Copying standalone projects from {}",
            self.config.standalone_dir.display()
        );
        let stats = merge::merge_into(
            output_dir,
            &[MergeSource::copy_tree(&self.config.standalone_dir, "")],
        )
        .map_err(|source| BuildError::Merge { phase, source })?;
        report.files_copied += stats.files;

        phase = phase.next();
        info!(target: "build", "Generating pages...");
        for page in SitePage::ALL {
            match self.render_page(page) {
                Ok(path) => {
                    info!(target: "build", "Generated {}", path.display());
                    report.pages_rendered.push(path);
                }
                Err(err) => {
                    error!(
                        target: "build",
                        "Failed to generate {}: {}",
                        page.route().output,
                        err
                    );
                    report.failed_pages.push(PageFailure {
                        page,
                        error: err.to_string(),
                    });
                }
            }
        }

        phase = phase.next();
        let cname_path = output_dir.join(CNAME_FILE);
        std::fs::write(&cname_path, format!("{}\n", self.cname)).map_err(|source| {
            BuildError::Io {
                phase,
                path: cname_path.clone(),
                source,
            }
        })?;
        info!(target: "build", "Pinned domain {}", self.cname);

        phase = phase.next();
        match self.write_sitemap() {
            Ok(path) => report.sitemap = Some(path),
            Err(err) => warn!(target: "build", "Skipping sitemap: {}", err),
        }

        report.phase = phase.next();
        Ok(report)
    }

    fn render_page(&self, page: SitePage) -> Result<PathBuf, PageError> {
        let record = self.portfolio.record_for(page)?;
        let html = self.renderer.render(page, &record)?;

        let output_path = output_path_for(&self.config.output_dir, page);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&output_path, html)?;

        Ok(output_path)
    }

    fn write_sitemap(&self) -> Result<PathBuf, SitemapError> {
        let xml = SitemapGenerator::new(self.config.base_url.trim()).generate(
            &self.routes(),
            &self.config.output_dir,
            &self.config.projects_subdir,
        )?;

        write_sitemap(&self.config.output_dir, &xml)
    }
}

#[derive(Debug, Error)]
enum PageError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Loads content and templates from the paths in `config` and runs a full
/// build. Every page template must be present before the output root is
/// wiped.
pub fn build_site(config: &BuildConfig) -> Result<BuildReport, BuildError> {
    config.validate()?;

    let portfolio = Portfolio::read(&config.content_file)?;
    let mut renderer = TemplateRenderer::new(&config.templates_dir)?;
    for page in SitePage::ALL {
        if !renderer.has_template(page.template_name()) {
            return Err(ConfigError::MissingTemplate {
                name: page.template_name(),
                dir: config.templates_dir.clone(),
            }
            .into());
        }
    }
    renderer.set_global_context("base_url", config.base_url.trim_end_matches('/'));
    renderer.set_global_context("navigation", &navigation());

    let site = SiteBuilder::new()
        .config(config.clone())
        .portfolio(portfolio)
        .renderer(renderer)
        .build()?;

    site.build()
}

#[derive(Debug, serde::Serialize)]
pub struct NavItem {
    pub text: String,
    pub link: String,
}

fn navigation() -> Vec<NavItem> {
    SitePage::ALL
        .iter()
        .map(|page| NavItem {
            text: page.title().to_string(),
            link: page.route().path,
        })
        .collect()
}

pub fn output_path_for(output_dir: &Path, page: SitePage) -> PathBuf {
    output_dir.join(page.route().output)
}
