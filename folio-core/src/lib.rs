pub mod builder;
pub mod config;
pub mod content;
pub mod merge;
pub mod render;
pub mod route;
pub mod sitemap;

// Re-export main types
pub use builder::{BuildError, BuildPhase, BuildReport, Site, SiteBuilder, build_site};
pub use config::{BuildConfig, ConfigError};
pub use content::{ContentRecord, Portfolio};
pub use render::{PageRenderer, RenderError, TemplateRenderer};
pub use route::{Route, SitePage, resolve_request, routes};
pub use sitemap::{SitemapGenerator, normalize_url};
