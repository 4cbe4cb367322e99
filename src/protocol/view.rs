use std::collections::HashMap;

use crate::error::AppError;

/// Placeholder in a view template replaced by the app mount point
pub const PAGE_PLACEHOLDER: &str = "@page";

/// Turns a named view plus the serialized page object into an HTML document
pub trait ViewResolver: Send + Sync {
    fn resolve(&self, view: &str, page: &str) -> Result<String, AppError>;
}

const DEFAULT_INDEX: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Admin</title>
    <script type="module" src="/build/app.js"></script>
</head>
<body>
    @page
</body>
</html>
"#;

/// Template registry that mounts the page object as `<div id="app" data-page="...">`
#[derive(Debug, Clone)]
pub struct HtmlShell {
    templates: HashMap<String, String>,
}

impl Default for HtmlShell {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlShell {
    pub fn new() -> Self {
        let mut templates = HashMap::new();
        templates.insert("index".to_string(), DEFAULT_INDEX.to_string());
        Self { templates }
    }

    pub fn with_template(mut self, view: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(view.into(), template.into());
        self
    }
}

impl ViewResolver for HtmlShell {
    fn resolve(&self, view: &str, page: &str) -> Result<String, AppError> {
        let template = self
            .templates
            .get(view)
            .ok_or_else(|| AppError::view(format!("unknown view '{}'", view)))?;

        let mount = format!(r#"<div id="app" data-page="{}"></div>"#, escape_attribute(page));
        Ok(template.replacen(PAGE_PLACEHOLDER, &mount, 1))
    }
}

pub fn escape_attribute(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + raw.len() / 4);
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Reverses `escape_attribute`; used to read the page back out of a document
pub fn unescape_attribute(escaped: &str) -> String {
    escaped
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Extracts the embedded page object JSON from a rendered shell
pub fn extract_page(document: &str) -> Option<String> {
    let start = document.find(r#"data-page=""#)? + r#"data-page=""#.len();
    let len = document[start..].find('"')?;
    Some(unescape_attribute(&document[start..start + len]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mounts_escaped_page_into_index() {
        let page = r#"{"component":"Welcome","props":{"q":"<b>&'x'"}}"#;
        let html = HtmlShell::new().resolve("index", page).unwrap();

        assert!(html.contains(r#"<div id="app" data-page=""#));
        assert!(!html.contains("@page"));
        assert!(!html.contains("<b>"));
        assert_eq!(extract_page(&html).as_deref(), Some(page));
    }

    #[test]
    fn unknown_views_are_errors() {
        let err = HtmlShell::new().resolve("missing", "{}").unwrap_err();
        assert!(matches!(err, AppError::View(_)));
    }

    #[test]
    fn custom_templates_override_defaults() {
        let shell = HtmlShell::new().with_template("index", "<main>@page</main>");
        let html = shell.resolve("index", "{}").unwrap();
        assert_eq!(html, r#"<main><div id="app" data-page="{}"></div></main>"#);
    }
}
