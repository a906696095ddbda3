//! # Format Renderer
//!
//! Converts a playbook's markdown into a standalone, styled HTML page for export.
//!
//! Rendering is stateless apart from the compiled template. Markdown is converted with
//! `pulldown-cmark`; whatever it does not understand is passed through as text. Playbook
//! bodies come from the model, so raw HTML inside them is escaped rather than emitted.

use crate::core::error::PlaybookResult;
use chrono::{DateTime, Local};
use pulldown_cmark::{html, Event, Options, Parser};
use tera::{Context, Tera};

const PAGE_TEMPLATE_NAME: &str = "playbook.html";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{{ category }} Playbook</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; margin: 40px; }
        h1, h2, h3 { color: #2c3e50; }
        code { background-color: #f8f8f8; padding: 2px 4px; border-radius: 4px; }
        pre { background-color: #f8f8f8; padding: 10px; border-radius: 4px; overflow-x: auto; }
        blockquote { border-left: 4px solid #ccc; padding-left: 15px; color: #666; }
        table { border-collapse: collapse; }
        th, td { border: 1px solid #ddd; padding: 6px 10px; }
        .header { margin-bottom: 30px; }
        .footer { margin-top: 30px; font-size: 0.8em; color: #999; }
    </style>
</head>
<body>
    <div class="header">
        <h1>OWASP Top 10 for LLM Applications 2025</h1>
        <h2>{{ category }} - Security Playbook</h2>
        <p>Generated on {{ generated_on }}</p>
    </div>

    {{ body | safe }}

    <div class="footer">
        <p>This playbook was auto-generated and should be reviewed by security professionals before implementation.</p>
        <p>Source: OWASP Top 10 for LLM Applications 2025</p>
    </div>
</body>
</html>
"#;

/// Markdown to HTML fragment
///
/// Raw HTML blocks and inline tags are rendered as escaped text. The result is the
/// only value the page template inserts unescaped.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// Renders playbooks into styled export pages
#[derive(Debug, Clone)]
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    /// Create a renderer with the built-in page template
    pub fn new() -> PlaybookResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)?;
        Ok(Self { tera })
    }

    /// Render `markdown` for `category` as a complete HTML page stamped with the local time
    pub fn render_page(&self, category: &str, markdown: &str) -> PlaybookResult<String> {
        self.render_page_at(category, markdown, Local::now())
    }

    /// Render with an explicit generation time
    pub fn render_page_at(
        &self,
        category: &str,
        markdown: &str,
        generated_at: DateTime<Local>,
    ) -> PlaybookResult<String> {
        let mut context = Context::new();
        context.insert("category", category);
        context.insert("generated_on", &generated_at.format("%Y-%m-%d %H:%M").to_string());
        context.insert("body", &markdown_to_html(markdown));

        Ok(self.tera.render(PAGE_TEMPLATE_NAME, &context)?)
    }
}
