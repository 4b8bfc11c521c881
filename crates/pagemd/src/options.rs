//! Configuration options for a transform run

use indexmap::IndexSet;

/// Tags that are stripped on every run, whatever the caller configures
pub const ALWAYS_REMOVED_TAGS: [&str; 2] = ["script", "style"];

/// Which html5ever entry point parses the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HtmlParser {
    /// Full document parse; `html`, `head` and `body` are implied
    #[default]
    Document,
    /// Fragment parse; nothing is implied and the whole fragment is serialized
    Fragment,
}

/// Options for a single transform run
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Rewrite images into `![alt](url)` tokens; drop them when false
    pub keep_images: bool,

    /// Rewrite anchors into `[text](url)` tokens; flatten them when false
    pub keep_links: bool,

    /// Drop images whose source contains `.gif`
    pub remove_gif_images: bool,

    /// Drop images whose source contains `.svg`
    pub remove_svg_images: bool,

    /// Extra source substrings that drop an image (matched case-sensitively)
    pub remove_image_types: Vec<String>,

    /// Tag names to strip together with their subtrees (case-insensitive)
    pub remove_tags: Vec<String>,

    /// When non-empty, keep only the outermost elements with these tag names
    pub include_tags: Vec<String>,

    /// Parser entry point
    pub html_parser: HtmlParser,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            keep_images: true,
            keep_links: true,
            remove_gif_images: true,
            remove_svg_images: true,
            remove_image_types: Vec::new(),
            remove_tags: Vec::new(),
            include_tags: Vec::new(),
            html_parser: HtmlParser::Document,
        }
    }
}

impl TransformOptions {
    /// Normalized include tags, lowercase, blanks dropped
    pub fn include_set(&self) -> IndexSet<String> {
        normalize_tags(&self.include_tags)
    }

    /// Tags the filter strips: `script`, `style` and `remove_tags` minus `include_tags`
    pub fn removal_set(&self) -> IndexSet<String> {
        let include = self.include_set();
        let mut tags: IndexSet<String> = ALWAYS_REMOVED_TAGS.iter().map(|t| t.to_string()).collect();
        tags.extend(
            normalize_tags(&self.remove_tags)
                .into_iter()
                .filter(|tag| !include.contains(tag)),
        );
        tags
    }

    /// Source substrings that cause an image to be dropped
    pub fn removed_image_suffixes(&self) -> IndexSet<String> {
        let mut suffixes = IndexSet::new();
        if self.remove_svg_images {
            suffixes.insert(".svg".to_string());
        }
        if self.remove_gif_images {
            suffixes.insert(".gif".to_string());
        }
        suffixes.extend(
            self.remove_image_types
                .iter()
                .filter(|s| !s.is_empty())
                .cloned(),
        );
        suffixes
    }
}

fn normalize_tags(tags: &[String]) -> IndexSet<String> {
    tags.iter()
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
