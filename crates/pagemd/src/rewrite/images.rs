use indexmap::IndexSet;
use tracing::debug;
use url::Url;

use super::{resolve, RewriteError};
use crate::diagnostics::{Stage, StageReport};
use crate::dom::{Document, NodeId};

/// Rewrite every `img` below `root`, in document order.
///
/// With `keep_images` off every image is dropped. Otherwise images without
/// a `src` are left alone, images whose `src` contains one of `suffixes`
/// are dropped, and the rest become `![alt](absolute-url)` text.
pub fn rewrite_images(
    doc: &mut Document,
    root: NodeId,
    base: &Url,
    keep_images: bool,
    suffixes: &IndexSet<String>,
) -> StageReport {
    let images = doc.find_elements(root, |tag| tag == "img");

    let report = images
        .into_iter()
        .fold(StageReport::default(), |report, img| {
            if !doc.is_attached_to(img, root) {
                return report;
            }
            if !keep_images {
                let outcome = doc.detach(img);
                return report.record(Stage::Images, img, outcome);
            }
            let Some(src) = doc.attr(img, "src").map(str::to_string) else {
                return report;
            };
            let outcome = rewrite_image(doc, img, &src, base, suffixes);
            report.record(Stage::Images, img, outcome)
        });

    debug!(rewritten = report.applied, "rewrote images");
    report
}

fn rewrite_image(
    doc: &mut Document,
    img: NodeId,
    src: &str,
    base: &Url,
    suffixes: &IndexSet<String>,
) -> Result<(), RewriteError> {
    if suffixes.iter().any(|suffix| src.contains(suffix.as_str())) {
        doc.detach(img)?;
        return Ok(());
    }

    let url = resolve(base, src)?;
    let alt = doc.attr(img, "alt").unwrap_or("Image");
    let token = format!("![{alt}]({url})");
    doc.replace_with_text(img, &token)?;
    Ok(())
}
