use std::path::{Component, Path, PathBuf};

/// A request path paired with the file it is rendered to, relative to the
/// output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub output: String,
}

impl Route {
    pub fn new<P: Into<String>, O: Into<String>>(path: P, output: O) -> Self {
        Self {
            path: path.into(),
            output: output.into(),
        }
    }

    /// Output file name without its `index.html` or `.html` suffix, which is
    /// the path the page is served under.
    pub fn clean_path(&self) -> &str {
        let output = self.output.trim_start_matches('/');
        if let Some(dir) = output.strip_suffix("index.html") {
            dir
        } else if let Some(stem) = output.strip_suffix(".html") {
            stem
        } else {
            output
        }
    }
}

/// The pages rendered from templates. Everything else in the output tree is
/// copied verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SitePage {
    Home,
    Projects,
    Apps,
}

impl SitePage {
    pub const ALL: [SitePage; 3] = [SitePage::Home, SitePage::Projects, SitePage::Apps];

    pub fn route(self) -> Route {
        match self {
            SitePage::Home => Route::new("/", "index.html"),
            SitePage::Projects => Route::new("/projects.html", "projects.html"),
            SitePage::Apps => Route::new("/apps.html", "apps.html"),
        }
    }

    pub fn template_name(self) -> &'static str {
        match self {
            SitePage::Home => "index.html",
            SitePage::Projects => "projects.html",
            SitePage::Apps => "apps.html",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SitePage::Home => "About Me",
            SitePage::Projects => "Projects",
            SitePage::Apps => "Apps",
        }
    }
}

pub fn routes() -> Vec<Route> {
    SitePage::ALL.iter().map(|page| page.route()).collect()
}

/// Maps a request path below `root` to the file that answers it.
///
/// Directory requests (empty path or trailing slash) resolve to that
/// directory's `index.html`. Paths that would leave `root` yield `None`.
pub fn resolve_request<P: AsRef<Path>>(root: P, request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    let mut resolved = root.as_ref().to_path_buf();

    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if trimmed.is_empty() || trimmed.ends_with('/') {
        resolved.push("index.html");
    }

    Some(resolved)
}
