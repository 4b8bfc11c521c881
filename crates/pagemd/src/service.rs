//! Transformer - the main entry point for HTML to Markdown conversion.

use indexmap::IndexSet;
use pagemd_core::Options;
use tracing::debug;
use url::Url;

use crate::convert::convert;
use crate::diagnostics::{Diagnostic, Stage};
use crate::filter::{remove_tags, scope_to_tags};
use crate::html::parse_html;
use crate::options::TransformOptions;
use crate::rewrite::{rewrite_images, rewrite_links};
use crate::whitespace::normalize_whitespace;
use crate::{Result, TransformError};

/// Markdown produced by a run, with the elements that had to be skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub markdown: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Converts page HTML to Markdown against a fixed base URL and options.
///
/// A `Transformer` holds no per-run state; every call parses its own
/// document, so one instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct Transformer {
    base_url: Url,
    options: TransformOptions,
    include_tags: IndexSet<String>,
    removal_tags: IndexSet<String>,
    image_suffixes: IndexSet<String>,
    markdown_options: Options,
}

impl Transformer {
    /// Create a transformer, validating `base_url` once
    pub fn new(base_url: &str, options: TransformOptions) -> Result<Self> {
        let invalid = |source| TransformError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        };
        let parsed = Url::parse(base_url.trim()).map_err(invalid)?;
        if parsed.cannot_be_a_base() {
            return Err(invalid(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        Ok(Self {
            base_url: parsed,
            include_tags: options.include_set(),
            removal_tags: options.removal_set(),
            image_suffixes: options.removed_image_suffixes(),
            markdown_options: markdown_options(),
            options,
        })
    }

    /// Convert an HTML page to Markdown
    pub fn transform(&self, html: &str) -> Result<String> {
        Ok(self.transform_with_diagnostics(html)?.markdown)
    }

    /// Convert an HTML page to Markdown and report skipped elements
    pub fn transform_with_diagnostics(&self, html: &str) -> Result<Transformed> {
        let mut doc = parse_html(html, self.options.html_parser)
            .map_err(|err| TransformError::Parse(err.to_string()))?;
        let root = doc.root();
        let mut diagnostics = Vec::new();
        let mut scoped = false;

        if !self.include_tags.is_empty() {
            match scope_to_tags(&mut doc, &self.include_tags) {
                Ok(0) => {
                    let requested: Vec<&str> = self.include_tags.iter().map(String::as_str).collect();
                    let diagnostic = Diagnostic::new(
                        Stage::IncludeTags,
                        None,
                        format!(
                            "No content found matching the specified include-tags: {}",
                            requested.join(", ")
                        ),
                    );
                    diagnostic.log();
                    diagnostics.push(diagnostic);
                    return Ok(Transformed {
                        markdown: String::new(),
                        diagnostics,
                    });
                }
                Ok(_) => scoped = true,
                Err(err) => {
                    let diagnostic = Diagnostic::new(Stage::IncludeTags, None, err.to_string());
                    diagnostic.log();
                    diagnostics.push(diagnostic);
                }
            }
        }

        let report = remove_tags(&mut doc, root, &self.removal_tags);
        diagnostics.extend(report.diagnostics);

        let report = rewrite_images(
            &mut doc,
            root,
            &self.base_url,
            self.options.keep_images,
            &self.image_suffixes,
        );
        diagnostics.extend(report.diagnostics);

        let report = rewrite_links(&mut doc, root, &self.base_url, self.options.keep_links);
        diagnostics.extend(report.diagnostics);

        let content_root = if scoped {
            root
        } else {
            doc.find_first(root, "body").unwrap_or(root)
        };

        let ast = convert(&doc, content_root)?;
        let raw = pagemd_core::serialize(&ast, &self.markdown_options);
        let markdown = normalize_whitespace(&raw);

        debug!(
            bytes = markdown.len(),
            skipped = diagnostics.len(),
            "transformed html to markdown"
        );

        Ok(Transformed {
            markdown,
            diagnostics,
        })
    }

    /// Get the base URL references are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the options this transformer was built with
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Tags stripped on every run
    pub fn removal_tags(&self) -> &IndexSet<String> {
        &self.removal_tags
    }
}

/// Serializer settings; anchors and images left in the tree are not re-rendered
fn markdown_options() -> Options {
    Options {
        bullet_list_marker: '*',
        em_delimiter: '*',
        strong_delimiter: "**".to_string(),
        ignore_links: true,
        ignore_images: true,
        ..Options::default()
    }
}

/// Convert an HTML page to Markdown in one call.
///
/// ```rust
/// use pagemd::{transform, TransformOptions};
///
/// let options = TransformOptions {
///     keep_links: false,
///     ..Default::default()
/// };
/// let markdown = transform(
///     r#"<h1>Docs</h1><p>See <a href="/guide">the guide</a>.</p>"#,
///     "https://example.com/",
///     &options,
/// )
/// .unwrap();
/// assert_eq!(markdown, "# Docs\n\nSee the guide.");
/// ```
pub fn transform(html: &str, base_url: &str, options: &TransformOptions) -> Result<String> {
    Transformer::new(base_url, options.clone())?.transform(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::HtmlParser;

    fn transformer(options: TransformOptions) -> Transformer {
        Transformer::new("https://ex.com/blog/", options).unwrap()
    }

    #[test]
    fn test_simple_paragraph() {
        let result = transformer(TransformOptions::default())
            .transform("<p>Hello World</p>")
            .unwrap();
        assert_eq!(result, "Hello World");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = Transformer::new("not a url", TransformOptions::default()).unwrap_err();
        assert!(matches!(err, TransformError::InvalidBaseUrl { .. }));

        let err = Transformer::new("mailto:me@ex.com", TransformOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidBaseUrl {
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_input() {
        let result = transformer(TransformOptions::default()).transform("").unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn test_head_content_ignored() {
        let result = transformer(TransformOptions::default())
            .transform("<html><head><title>T</title></head><body><p>B</p></body></html>")
            .unwrap();
        assert_eq!(result, "B");
    }

    #[test]
    fn test_custom_remove_tags() {
        let options = TransformOptions {
            remove_tags: vec!["NAV".to_string(), "footer".to_string()],
            ..Default::default()
        };
        let result = transformer(options)
            .transform("<nav><a href='/'>Home</a></nav><p>Body</p><footer>(c)</footer>")
            .unwrap();
        assert_eq!(result, "Body");
    }

    #[test]
    fn test_include_tags_scope() {
        let options = TransformOptions {
            include_tags: vec!["article".to_string()],
            remove_tags: vec!["article".to_string(), "aside".to_string()],
            ..Default::default()
        };
        let result = transformer(options)
            .transform(
                "<header>Site</header><article><h2>One</h2><aside>ad</aside></article>\
                 <p>between</p><article><p>Two</p><script>x()</script></article>",
            )
            .unwrap();
        assert_eq!(result, "## One\n\nTwo");
    }

    #[test]
    fn test_include_tags_no_match() {
        let options = TransformOptions {
            include_tags: vec!["main".to_string(), "Article".to_string()],
            ..Default::default()
        };
        let result = transformer(options)
            .transform_with_diagnostics("<p>Body</p>")
            .unwrap();
        assert_eq!(result.markdown, "");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result.diagnostics[0].message,
            "No content found matching the specified include-tags: main, article"
        );
    }

    #[test]
    fn test_fragment_parser() {
        let options = TransformOptions {
            html_parser: HtmlParser::Fragment,
            ..Default::default()
        };
        let result = transformer(options)
            .transform("<h1>Title</h1><p>Text with <img src='a.png' alt='A'></p>")
            .unwrap();
        assert_eq!(result, "# Title\n\nText with ![A](https://ex.com/blog/a.png)");
    }

    #[test]
    fn test_diagnostics_do_not_abort() {
        let result = transformer(TransformOptions::default())
            .transform_with_diagnostics(
                r#"<p><img src="http://[bad" alt="x"><a href="http://[bad">broken</a> <a href="ok">fine</a></p>"#,
            )
            .unwrap();
        assert_eq!(result.markdown, "broken [fine](https://ex.com/blog/ok)");
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(result.diagnostics[0].stage, Stage::Images);
        assert_eq!(result.diagnostics[1].stage, Stage::Links);
    }

    #[test]
    fn test_accessors() {
        let t = transformer(TransformOptions::default());
        assert_eq!(t.base_url().as_str(), "https://ex.com/blog/");
        assert!(t.options().keep_links);
        assert!(t.removal_tags().contains("script"));
    }

    #[test]
    fn test_transformer_is_reusable() {
        let t = transformer(TransformOptions::default());
        assert_eq!(t.transform("<p>a</p>").unwrap(), "a");
        assert_eq!(t.transform("<p>b</p>").unwrap(), "b");
    }
}
