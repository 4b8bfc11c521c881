use tracing::debug;
use url::Url;

use super::{resolve, RewriteError};
use crate::diagnostics::{Stage, StageReport};
use crate::dom::{Document, NodeId};

/// Rewrite every `a` with an `href` below `root`, in document order.
///
/// With `keep_links` off the anchor is replaced by its text. Otherwise it
/// becomes `[text](absolute-url)`, or `[absolute-url](absolute-url)` when
/// the anchor has no visible text.
pub fn rewrite_links(doc: &mut Document, root: NodeId, base: &Url, keep_links: bool) -> StageReport {
    let anchors: Vec<NodeId> = doc
        .find_elements(root, |tag| tag == "a")
        .into_iter()
        .filter(|&a| doc.attr(a, "href").is_some())
        .collect();

    let report = anchors
        .into_iter()
        .fold(StageReport::default(), |report, anchor| {
            if !doc.is_attached_to(anchor, root) {
                return report;
            }
            let outcome = rewrite_link(doc, anchor, base, keep_links);
            report.record(Stage::Links, anchor, outcome)
        });

    debug!(rewritten = report.applied, "rewrote links");
    report
}

fn rewrite_link(doc: &mut Document, anchor: NodeId, base: &Url, keep_links: bool) -> Result<(), RewriteError> {
    let text = doc.text_content(anchor);
    if !keep_links {
        doc.replace_with_text(anchor, &text)?;
        return Ok(());
    }

    let href = doc.attr(anchor, "href").unwrap_or_default();
    let url = resolve(base, href)?;
    let text = text.trim();
    let token = if text.is_empty() {
        format!("[{url}]({url})")
    } else {
        format!("[{text}]({url})")
    };
    doc.replace_with_text(anchor, &token)?;
    Ok(())
}
