//! HTML parsing support.
//!
//! Parses an HTML string with `scraper` (html5ever underneath) and copies the
//! result into the mutable [`Document`] arena the pipeline edits.

use scraper::{Html, Node as ScraperNode};
use tracing::debug;

use crate::dom::{Document, DomError};
use crate::options::HtmlParser;

/// Parse an HTML string into a [`Document`].
///
/// With [`HtmlParser::Document`] the input is parsed as a full page, so
/// `html`, `head` and `body` are implied when missing. With
/// [`HtmlParser::Fragment`] the parsed nodes are placed directly under a
/// fragment root.
///
/// # Example
///
/// ```rust
/// use pagemd::{parse_html, HtmlParser};
///
/// let doc = parse_html("<p>Hello <em>World</em></p>", HtmlParser::Document).unwrap();
/// let body = doc.find_first(doc.root(), "body").unwrap();
/// assert_eq!(doc.text_content(body), "Hello World");
/// ```
pub fn parse_html(html: &str, parser: HtmlParser) -> Result<Document, DomError> {
    let parsed = match parser {
        HtmlParser::Document => Html::parse_document(html),
        HtmlParser::Fragment => Html::parse_fragment(html),
    };

    if !parsed.errors.is_empty() {
        debug!(errors = parsed.errors.len(), "html parser recovered from errors");
    }

    let (mut doc, top) = match parser {
        HtmlParser::Document => (Document::new(), parsed.tree.root()),
        HtmlParser::Fragment => (Document::fragment(), *parsed.root_element()),
    };

    let root = doc.root();
    let mut stack: Vec<_> = top.children().rev().map(|child| (child, root)).collect();

    while let Some((source, parent)) = stack.pop() {
        let created = match source.value() {
            ScraperNode::Element(element) => {
                let attributes = element
                    .attrs()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect();
                doc.create_element(element.name(), attributes)
            }
            ScraperNode::Text(text) => doc.create_text(&text.text),
            _ => continue,
        };
        doc.append_child(parent, created)?;

        stack.extend(source.children().rev().map(|child| (child, created)));
    }

    debug!(nodes = doc.len(), "parsed html");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_implies_body() {
        let doc = parse_html("<p>Hello World</p>", HtmlParser::Document).unwrap();
        let root = doc.root();
        let html = doc.element_children(root).next().unwrap();
        assert_eq!(doc.tag_name(html), Some("html"));

        let body = doc.find_first(root, "body").unwrap();
        let p = doc.element_children(body).next().unwrap();
        assert_eq!(doc.tag_name(p), Some("p"));
        assert_eq!(doc.text_content(p), "Hello World");
    }

    #[test]
    fn test_parse_fragment_has_no_body() {
        let doc = parse_html("<p>One</p><p>Two</p>", HtmlParser::Fragment).unwrap();
        let root = doc.root();
        assert!(doc.find_first(root, "body").is_none());
        assert_eq!(doc.element_children(root).count(), 2);
    }

    #[test]
    fn test_attributes_preserved() {
        let doc = parse_html(
            r#"<a HREF="/docs" title="Docs">x</a>"#,
            HtmlParser::Fragment,
        )
        .unwrap();
        let a = doc.find_first(doc.root(), "a").unwrap();
        assert_eq!(doc.attr(a, "href"), Some("/docs"));
        assert_eq!(doc.attr(a, "title"), Some("Docs"));
    }

    #[test]
    fn test_comments_are_dropped() {
        let doc = parse_html("<div><!-- note -->text</div>", HtmlParser::Fragment).unwrap();
        let div = doc.find_first(doc.root(), "div").unwrap();
        assert_eq!(doc.children(div).len(), 1);
        assert_eq!(doc.text_content(div), "text");
    }

    #[test]
    fn test_sibling_order_kept() {
        let doc = parse_html("<ul><li>a</li><li>b</li><li>c</li></ul>", HtmlParser::Fragment)
            .unwrap();
        let ul = doc.find_first(doc.root(), "ul").unwrap();
        let texts: Vec<String> = doc
            .element_children(ul)
            .map(|li| doc.text_content(li))
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_input() {
        let doc = parse_html("", HtmlParser::Document).unwrap();
        let body = doc.find_first(doc.root(), "body").unwrap();
        assert!(doc.children(body).is_empty());
    }
}
