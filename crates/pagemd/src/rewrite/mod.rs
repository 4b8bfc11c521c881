//! Image and link rewriting.
//!
//! Both rewriters replace matched elements in place with literal Markdown
//! tokens carrying absolute URLs, so the serializer only ever sees text.

mod images;
mod links;

pub use images::rewrite_images;
pub use links::rewrite_links;

use url::Url;

use crate::dom::DomError;

/// Failure while rewriting a single element
#[derive(Debug, thiserror::Error)]
pub(crate) enum RewriteError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("could not resolve {reference:?}: {source}")]
    Url {
        reference: String,
        #[source]
        source: url::ParseError,
    },
}

/// Resolve a reference found in the page against the page URL.
///
/// Absolute references pass through unchanged; everything else, including
/// protocol-relative, query-only and fragment-only forms, is joined with
/// RFC 3986 reference resolution.
///
/// ```rust
/// use url::Url;
/// use pagemd::resolve_url;
///
/// let base = Url::parse("https://example.com/x/").unwrap();
/// assert_eq!(resolve_url(&base, "/a/b.png").unwrap(), "https://example.com/a/b.png");
/// assert_eq!(resolve_url(&base, "//cdn.net/i.png").unwrap(), "https://cdn.net/i.png");
/// assert_eq!(resolve_url(&base, "mailto:hi@example.com").unwrap(), "mailto:hi@example.com");
/// ```
pub fn resolve_url(base: &Url, reference: &str) -> Result<String, url::ParseError> {
    let reference = reference.trim();
    if Url::parse(reference).is_ok() {
        return Ok(reference.to_string());
    }
    base.join(reference).map(String::from)
}

pub(crate) fn resolve(base: &Url, reference: &str) -> Result<String, RewriteError> {
    resolve_url(base, reference).map_err(|source| RewriteError::Url {
        reference: reference.to_string(),
        source,
    })
}
