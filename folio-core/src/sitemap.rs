use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::NaiveDate;
use log::{info, warn};
use thiserror::Error;
use url::Url;
use walkdir::WalkDir;

use crate::route::Route;

pub const SITEMAP_FILE: &str = "sitemap.xml";

/// Every entry is a build-time snapshot, so the frequency is fixed.
pub const CHANGEFREQ: &str = "monthly";

const XML_PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("base URL `{0}` cannot carry a path")]
    NotABase(String),
    #[error("failed to scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: NaiveDate,
    pub changefreq: &'static str,
}

impl SitemapEntry {
    fn to_xml(&self) -> String {
        format!(
            concat!(
                "  <url>\n",
                "    <loc>{}</loc>\n",
                "    <lastmod>{}</lastmod>\n",
                "    <changefreq>{}</changefreq>\n",
                "  </url>\n",
            ),
            html_escape::encode_text(&self.loc),
            self.lastmod.format("%Y-%m-%d"),
            self.changefreq,
        )
    }
}

pub struct SitemapGenerator {
    base_url: String,
    lastmod: NaiveDate,
}

impl SitemapGenerator {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            lastmod: chrono::Local::now().date_naive(),
        }
    }

    /// Date stamped on every entry. Defaults to today.
    pub fn lastmod(mut self, date: NaiveDate) -> Self {
        self.lastmod = date;
        self
    }

    /// The base URL with doubled slashes collapsed and exactly one trailing
    /// slash. This is the only URL allowed to end in `/` among route entries.
    pub fn site_root(&self) -> Result<Url, SitemapError> {
        let raw = normalize_url(self.base_url.trim());
        let mut root = Url::parse(&raw).map_err(|source| SitemapError::InvalidBaseUrl {
            url: raw.clone(),
            source,
        })?;
        if root.cannot_be_a_base() {
            return Err(SitemapError::NotABase(raw));
        }

        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }

        Ok(root)
    }

    /// Collects the entries for `routes` followed by one entry per
    /// `index.html` found under `scan_root/subtree`.
    ///
    /// Standalone URLs are relative to `scan_root`, so `subtree` only narrows
    /// the walk. A missing subtree contributes nothing, and an `index.html`
    /// directly in `scan_root` is the site root, which the routes already
    /// cover.
    pub fn entries(
        &self,
        routes: &[Route],
        scan_root: &Path,
        subtree: &Path,
    ) -> Result<Vec<SitemapEntry>, SitemapError> {
        let root = self.site_root()?;

        let mut urls: Vec<Url> = routes
            .iter()
            .map(|route| {
                let segments = route.clean_path().split('/').filter(|s| !s.is_empty());
                append_segments(&root, segments, false)
            })
            .collect();

        let scan_dir = scan_root.join(subtree);
        if scan_dir.is_dir() {
            for entry in WalkDir::new(&scan_dir).follow_links(true).sort_by_file_name() {
                let entry = entry.map_err(|source| SitemapError::Scan {
                    path: scan_dir.clone(),
                    source,
                })?;

                if !entry.file_type().is_file() || entry.file_name() != "index.html" {
                    continue;
                }

                let Some(parent) = entry.path().parent() else {
                    continue;
                };
                let Ok(relative) = parent.strip_prefix(scan_root) else {
                    continue;
                };
                if relative.as_os_str().is_empty() {
                    continue;
                }

                let Some(segments) = url_segments(relative) else {
                    warn!(
                        target: "sitemap",
                        "Skipping {}: path is not valid UTF-8",
                        parent.display()
                    );
                    continue;
                };
                urls.push(append_segments(&root, segments.iter().map(String::as_str), true));
            }
        }

        Ok(urls
            .into_iter()
            .map(|loc| SitemapEntry {
                loc: loc.into(),
                lastmod: self.lastmod,
                changefreq: CHANGEFREQ,
            })
            .collect())
    }

    pub fn generate(
        &self,
        routes: &[Route],
        scan_root: &Path,
        subtree: &Path,
    ) -> Result<String, SitemapError> {
        let entries = self.entries(routes, scan_root, subtree)?;
        Ok(render_sitemap(&entries))
    }
}

pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = format!("{XML_PROLOG}\n<urlset xmlns=\"{SITEMAP_NS}\">\n");
    for entry in entries {
        xml.push_str(&entry.to_xml());
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn write_sitemap<P: AsRef<Path>>(output_root: P, xml: &str) -> Result<PathBuf, SitemapError> {
    let path = output_root.as_ref().join(SITEMAP_FILE);
    fs::write(&path, xml).map_err(|source| SitemapError::Write {
        path: path.clone(),
        source,
    })?;

    info!(target: "sitemap", "Generated sitemap at {}", path.display());
    Ok(path)
}

/// Appends percent-encoded segments to `root`. No segments means the root
/// itself, which keeps its trailing slash.
fn append_segments<'a, I>(root: &Url, segments: I, trailing_slash: bool) -> Url
where
    I: IntoIterator<Item = &'a str>,
{
    let mut segments = segments.into_iter().peekable();
    if segments.peek().is_none() {
        return root.clone();
    }

    let mut url = root.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
        if trailing_slash {
            path.push("");
        }
    }
    url
}

/// Path components of a relative directory, `None` if any is not UTF-8.
fn url_segments(path: &Path) -> Option<Vec<String>> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_str().map(str::to_string)),
            _ => None,
        })
        .collect()
}

/// Collapses doubled slashes after the scheme separator.
pub fn normalize_url(url: &str) -> String {
    let (scheme, rest) = match url.find("://") {
        Some(idx) => url.split_at(idx + 3),
        None => ("", url),
    };

    let mut collapsed = String::with_capacity(rest.len());
    let mut previous_slash = false;
    for c in rest.chars() {
        if c == '/' && previous_slash {
            continue;
        }
        previous_slash = c == '/';
        collapsed.push(c);
    }

    format!("{scheme}{collapsed}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const BASE: &str = "https://example.com";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<html></html>").unwrap();
    }

    fn locs(entries: &[SitemapEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.loc.as_str()).collect()
    }

    fn main_routes() -> [Route; 2] {
        [
            Route::new("/", "index.html"),
            Route::new("/projects", "projects.html"),
        ]
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("https://example.com//a//b"), "https://example.com/a/b");
        assert_eq!(normalize_url("https://example.com//"), "https://example.com/");
        assert_eq!(normalize_url("https://example.com/a//b/"), "https://example.com/a/b/");
    }

    #[test]
    fn test_base_url_with_trailing_slash() {
        let generator = SitemapGenerator::new("https://example.com/").lastmod(date());
        let entries = generator
            .entries(&main_routes(), Path::new("/nonexistent"), Path::new(""))
            .unwrap();
        assert_eq!(
            locs(&entries),
            vec!["https://example.com/", "https://example.com/projects"]
        );
    }

    #[test]
    fn test_base_url_with_path() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("projects/misc/calculator/index.html"));

        for base in ["https://user.github.io/site", "https://user.github.io/site/"] {
            let entries = SitemapGenerator::new(base)
                .lastmod(date())
                .entries(&main_routes(), tmp.path(), Path::new("projects"))
                .unwrap();

            assert_eq!(
                locs(&entries),
                vec![
                    "https://user.github.io/site/",
                    "https://user.github.io/site/projects",
                    "https://user.github.io/site/projects/misc/calculator/",
                ]
            );
        }
    }

    #[test]
    fn test_invalid_base_url() {
        let generator = SitemapGenerator::new("not a url");
        assert!(matches!(
            generator.entries(&main_routes(), Path::new("/nonexistent"), Path::new("")),
            Err(SitemapError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_routes_then_standalone_entries() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("misc/calculator/index.html"));
        touch(&tmp.path().join("misc/calculator/script.js"));

        let entries = SitemapGenerator::new(BASE)
            .lastmod(date())
            .entries(&main_routes(), tmp.path(), Path::new(""))
            .unwrap();

        assert_eq!(
            locs(&entries),
            vec![
                "https://example.com/",
                "https://example.com/projects",
                "https://example.com/misc/calculator/",
            ]
        );
    }

    #[test]
    fn test_root_index_not_listed_twice() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("index.html"));
        touch(&tmp.path().join("projects/a/index.html"));

        let entries = SitemapGenerator::new(BASE)
            .lastmod(date())
            .entries(&main_routes(), tmp.path(), Path::new(""))
            .unwrap();

        assert_eq!(
            locs(&entries),
            vec![
                "https://example.com/",
                "https://example.com/projects",
                "https://example.com/projects/a/",
            ]
        );
    }

    #[test]
    fn test_subtree_limits_scan_but_not_urls() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("index.html"));
        touch(&tmp.path().join("static/vendor/index.html"));
        touch(&tmp.path().join("projects/misc/deciscope/index.html"));
        touch(&tmp.path().join("projects/misc/calculator/index.html"));
        touch(&tmp.path().join("projects/misc/geolocation/script.js"));

        let entries = SitemapGenerator::new(BASE)
            .lastmod(date())
            .entries(&[], tmp.path(), Path::new("projects"))
            .unwrap();

        assert_eq!(
            locs(&entries),
            vec![
                "https://example.com/projects/misc/calculator/",
                "https://example.com/projects/misc/deciscope/",
            ]
        );
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("projects/my game/index.html"));

        let entries = SitemapGenerator::new(BASE)
            .lastmod(date())
            .entries(&[], tmp.path(), Path::new("projects"))
            .unwrap();

        assert_eq!(locs(&entries), vec!["https://example.com/projects/my%20game/"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_directories_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join("projects").join(OsStr::from_bytes(b"bad\xff"));
        touch(&bad.join("index.html"));
        touch(&tmp.path().join("projects/good/index.html"));

        let entries = SitemapGenerator::new(BASE)
            .lastmod(date())
            .entries(&[], tmp.path(), Path::new("projects"))
            .unwrap();

        assert_eq!(locs(&entries), vec!["https://example.com/projects/good/"]);
    }

    #[test]
    fn test_missing_subtree_yields_route_entries_only() {
        let tmp = TempDir::new().unwrap();
        let entries = SitemapGenerator::new(BASE)
            .lastmod(date())
            .entries(
                &[Route::new("/apps.html", "apps.html")],
                tmp.path(),
                Path::new("projects"),
            )
            .unwrap();
        assert_eq!(locs(&entries), vec!["https://example.com/apps"]);
    }

    #[test]
    fn test_no_doubled_separators() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("projects/a/index.html"));

        let routes = [
            Route::new("/", "/index.html"),
            Route::new("/blog/", "blog/index.html"),
        ];
        let entries = SitemapGenerator::new("https://example.com//")
            .lastmod(date())
            .entries(&routes, tmp.path(), Path::new("projects"))
            .unwrap();

        for entry in &entries {
            let after_scheme = entry.loc.split_once("://").unwrap().1;
            assert!(!after_scheme.contains("//"), "{}", entry.loc);
        }
        assert_eq!(
            locs(&entries),
            vec![
                "https://example.com/",
                "https://example.com/blog",
                "https://example.com/projects/a/",
            ]
        );
    }

    #[test]
    fn test_render_document() {
        let entries = vec![SitemapEntry {
            loc: "https://example.com/a&b".to_string(),
            lastmod: date(),
            changefreq: CHANGEFREQ,
        }];

        assert_eq!(
            render_sitemap(&entries),
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
                "  <url>\n",
                "    <loc>https://example.com/a&amp;b</loc>\n",
                "    <lastmod>2024-05-01</lastmod>\n",
                "    <changefreq>monthly</changefreq>\n",
                "  </url>\n",
                "</urlset>\n",
            )
        );
    }

    #[test]
    fn test_write_sitemap() {
        let tmp = TempDir::new().unwrap();
        let path = write_sitemap(tmp.path(), "<urlset/>").unwrap();
        assert_eq!(path, tmp.path().join("sitemap.xml"));
        assert_eq!(fs::read_to_string(path).unwrap(), "<urlset/>");

        let missing = tmp.path().join("missing");
        assert!(matches!(
            write_sitemap(&missing, "x"),
            Err(SitemapError::Write { .. })
        ));
    }
}
