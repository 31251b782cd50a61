use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::content::ContentRecord;
use crate::route::SitePage;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template `{0}` not found")]
    TemplateNotFound(String),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

/// Turns a page and its content into a complete HTML document.
pub trait PageRenderer {
    fn render(&self, page: SitePage, model: &ContentRecord) -> Result<Vec<u8>, RenderError>;
}

pub struct TemplateRenderer {
    tera: Tera,
    context: Context,
}

impl TemplateRenderer {
    /// Loads every `.html` template below `templates_dir`.
    pub fn new<P: AsRef<Path>>(templates_dir: P) -> Result<Self, RenderError> {
        let glob = templates_dir.as_ref().join("**").join("*.html");
        let tera = Tera::new(&glob.to_string_lossy())?;

        Ok(Self::from_tera(tera))
    }

    pub fn from_tera(mut tera: Tera) -> Self {
        // Pages are full documents, so autoescape applies to every template.
        tera.autoescape_on(vec![".html", ".htm", ".xml"]);

        Self {
            tera,
            context: Context::new(),
        }
    }

    /// Add a value visible to every page. Page records take precedence.
    pub fn set_global_context<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        self.context.insert(key, value);
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|loaded| loaded == name)
    }
}

impl PageRenderer for TemplateRenderer {
    fn render(&self, page: SitePage, model: &ContentRecord) -> Result<Vec<u8>, RenderError> {
        let template = page.template_name();
        if !self.has_template(template) {
            return Err(RenderError::TemplateNotFound(template.to_string()));
        }

        let mut context = self.context.clone();
        for (key, value) in model {
            context.insert(key.as_str(), value);
        }

        Ok(self.tera.render(template, &context)?.into_bytes())
    }
}
