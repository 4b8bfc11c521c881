//! Configuration options for Markdown serialization
//!
//! Headings are always ATX and code blocks always fenced.

/// Options for Markdown serialization
#[derive(Debug, Clone)]
pub struct Options {
    /// Horizontal rule string
    pub hr: String,

    /// Bullet list marker
    pub bullet_list_marker: char,

    /// Fence string for fenced code blocks
    pub fence: String,

    /// Emphasis delimiter
    pub em_delimiter: char,

    /// Strong delimiter
    pub strong_delimiter: String,

    /// Render `Inline::Link` as its bare content
    pub ignore_links: bool,

    /// Drop `Inline::Image` entirely
    pub ignore_images: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            hr: "* * *".to_string(),
            bullet_list_marker: '*',
            fence: "```".to_string(),
            em_delimiter: '*',
            strong_delimiter: "**".to_string(),
            ignore_links: false,
            ignore_images: false,
        }
    }
}
