//! Tag filtering and include-tag scoping

use indexmap::IndexSet;
use tracing::debug;

use crate::diagnostics::{Stage, StageReport};
use crate::dom::{Document, DomError, NodeId};

/// Detach every element below `root` whose tag is in `tags`, with its subtree.
///
/// Matches nested inside an already removed element are skipped. A failure
/// on one element is recorded and the rest are still removed.
pub fn remove_tags(doc: &mut Document, root: NodeId, tags: &IndexSet<String>) -> StageReport {
    let matches = doc.find_elements(root, |tag| tags.contains(tag));

    let report = matches
        .into_iter()
        .fold(StageReport::default(), |report, node| {
            if !doc.is_attached_to(node, root) {
                return report;
            }
            let outcome = doc.detach(node);
            report.record(Stage::TagFilter, node, outcome)
        });

    debug!(removed = report.applied, "filtered tags");
    report
}

/// Replace the children of the root with the outermost elements whose tag is in `tags`.
///
/// Matches keep their document order. Returns how many elements were kept;
/// when nothing matches the document is left untouched.
pub fn scope_to_tags(doc: &mut Document, tags: &IndexSet<String>) -> Result<usize, DomError> {
    let root = doc.root();
    let matches: Vec<NodeId> = doc
        .find_elements(root, |tag| tags.contains(tag))
        .into_iter()
        .filter(|&node| !has_matching_ancestor(doc, node, root, tags))
        .collect();

    if matches.is_empty() {
        return Ok(0);
    }

    for child in doc.children(root).to_vec() {
        doc.detach(child)?;
    }
    for &node in &matches {
        doc.append_child(root, node)?;
    }

    debug!(kept = matches.len(), "scoped document to include tags");
    Ok(matches.len())
}

fn has_matching_ancestor(doc: &Document, node: NodeId, root: NodeId, tags: &IndexSet<String>) -> bool {
    let mut current = doc.parent(node);
    while let Some(ancestor) = current {
        if ancestor == root {
            return false;
        }
        if doc.tag_name(ancestor).is_some_and(|tag| tags.contains(tag)) {
            return true;
        }
        current = doc.parent(ancestor);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::options::HtmlParser;

    fn set(tags: &[&str]) -> IndexSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_remove_script_and_style() {
        let mut doc = parse_html(
            "<div>Keep<script>alert(1)</script><style>p{}</style></div>",
            HtmlParser::Fragment,
        )
        .unwrap();
        let root = doc.root();

        let report = remove_tags(&mut doc, root, &set(&["script", "style"]));
        assert_eq!(report.applied, 2);
        assert!(report.diagnostics.is_empty());
        assert_eq!(doc.text_content(root), "Keep");
    }

    #[test]
    fn test_nested_matches_removed_once() {
        let mut doc = parse_html(
            "<nav><nav><a>deep</a></nav></nav><p>body</p>",
            HtmlParser::Fragment,
        )
        .unwrap();
        let root = doc.root();

        let report = remove_tags(&mut doc, root, &set(&["nav"]));
        assert_eq!(report.applied, 1);
        assert_eq!(doc.text_content(root), "body");
    }

    #[test]
    fn test_malformed_node_is_skipped() {
        let mut doc = parse_html("<aside>a</aside><aside>b</aside><p>c</p>", HtmlParser::Fragment)
            .unwrap();
        let root = doc.root();
        let asides = doc.find_elements(root, |tag| tag == "aside");
        doc.corrupt_parent_link(asides[0], asides[1]);

        let report = remove_tags(&mut doc, root, &set(&["aside"]));
        assert_eq!(report.applied, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].stage, Stage::TagFilter);
        assert_eq!(report.diagnostics[0].node, Some(asides[0]));
        assert_eq!(doc.text_content(root), "ac");
    }

    #[test]
    fn test_scope_keeps_outermost_in_order() {
        let mut doc = parse_html(
            "<header>h</header><article>one<article>inner</article></article><p>x</p><article>two</article>",
            HtmlParser::Fragment,
        )
        .unwrap();
        let root = doc.root();

        let kept = scope_to_tags(&mut doc, &set(&["article"])).unwrap();
        assert_eq!(kept, 2);
        let texts: Vec<String> = doc
            .element_children(root)
            .map(|n| doc.text_content(n))
            .collect();
        assert_eq!(texts, vec!["oneinner", "two"]);
    }

    #[test]
    fn test_scope_without_match_leaves_document() {
        let mut doc = parse_html("<p>x</p>", HtmlParser::Fragment).unwrap();
        let kept = scope_to_tags(&mut doc, &set(&["main"])).unwrap();
        assert_eq!(kept, 0);
        assert_eq!(doc.text_content(doc.root()), "x");
    }
}
