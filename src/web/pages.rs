//! HTML pages rendered with `minijinja` from templates compiled into the binary.

use minijinja::Environment;
use serde::Serialize;

use crate::{AppError, Result};

const TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("dashboard.html", include_str!("../../templates/dashboard.html")),
    ("upload.html", include_str!("../../templates/upload.html")),
    ("tasks.html", include_str!("../../templates/tasks.html")),
];

/// Compiled template set.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    /// Compile every embedded template.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a template has a syntax error.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|err| AppError::Config(format!("template {name}: {err}")))?;
        }
        Ok(Self { env })
    }

    /// Render `name` with `context`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the template is unknown or rendering fails.
    pub fn render<C: Serialize>(&self, name: &str, context: C) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(context))
            .map_err(|err| AppError::Config(format!("render {name}: {err}")))
    }
}
