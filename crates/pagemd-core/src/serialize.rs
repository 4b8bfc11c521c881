//! Markdown AST serialization
//!
//! Converts Markdown AST nodes into Markdown text. Text is written verbatim:
//! nothing is escaped apart from pipes inside table cells, and nothing is
//! wrapped. Blank-line cleanup of the
//! result is left to the caller.

use crate::ast::{Block, Inline, ListItem};
use crate::options::Options;

/// Serialize a block to Markdown string
pub fn serialize(block: &Block, options: &Options) -> String {
    let mut output = String::with_capacity(4096);
    serialize_block(block, options, &mut output);
    output
}

fn serialize_block(block: &Block, options: &Options, out: &mut String) {
    match block {
        Block::Document(blocks) => serialize_blocks(blocks, options, out),

        Block::Heading { level, content } => serialize_heading(*level, content, options, out),

        Block::Paragraph(inlines) => {
            let text = render_inlines(inlines, options);
            let text = trim_paragraph(&text);
            if !text.is_empty() {
                out.push_str(text);
                out.push_str("\n\n");
            }
        }

        Block::BlockQuote(blocks) => {
            let mut inner = String::new();
            serialize_blocks(blocks, options, &mut inner);

            for (i, line) in inner.trim_end().lines().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push('>');
                if !line.is_empty() {
                    out.push(' ');
                    out.push_str(line);
                }
            }
            out.push_str("\n\n");
        }

        Block::List {
            ordered,
            start,
            items,
        } => serialize_list(*ordered, *start, items, options, out),

        Block::CodeBlock { language, code } => {
            serialize_code_block(language.as_deref(), code, options, out)
        }

        Block::ThematicBreak => {
            out.push_str(&options.hr);
            out.push_str("\n\n");
        }

        Block::Table { headers, rows } => serialize_table(headers, rows, options, out),
    }
}

fn serialize_blocks(blocks: &[Block], options: &Options, out: &mut String) {
    for block in blocks {
        if !block.is_blank() {
            serialize_block(block, options, out);
        }
    }
}

fn serialize_heading(level: u8, content: &[Inline], options: &Options, out: &mut String) {
    let text = render_inlines(content, options).replace('\n', " ");
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    out.push_str(&"#".repeat(usize::from(level.clamp(1, 6))));
    out.push(' ');
    out.push_str(text);
    out.push_str("\n\n");
}

fn serialize_list(ordered: bool, start: u32, items: &[ListItem], options: &Options, out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        let marker = if ordered {
            format!("{}. ", u64::from(start) + i as u64)
        } else {
            format!("{} ", options.bullet_list_marker)
        };

        let content = render_list_item(item, options);
        if content.is_empty() {
            out.push_str(marker.trim_end());
            out.push('\n');
            continue;
        }

        // Continuation lines line up with the text after the marker
        let continuation = " ".repeat(marker.chars().count());
        out.push_str(&marker);
        for (n, line) in content.lines().enumerate() {
            if n > 0 {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str(&continuation);
                }
            }
            out.push_str(line);
        }
        out.push('\n');
    }

    out.push('\n');
}

fn render_list_item(item: &ListItem, options: &Options) -> String {
    let mut buf = String::new();
    let mut prev_paragraph = false;

    for block in item.content.iter().filter(|b| !b.is_blank()) {
        match block {
            Block::Paragraph(inlines) => {
                if prev_paragraph {
                    buf.push('\n');
                }
                buf.push_str(trim_paragraph(&render_inlines(inlines, options)));
                buf.push('\n');
                prev_paragraph = true;
            }
            _ => {
                serialize_block(block, options, &mut buf);
                prev_paragraph = false;
            }
        }
    }

    buf.trim_end().to_string()
}

fn serialize_code_block(language: Option<&str>, code: &str, options: &Options, out: &mut String) {
    let code = code.trim_end_matches('\n');
    let fence = fence_for(code, &options.fence);

    out.push_str(&fence);
    out.push_str(language.unwrap_or(""));
    out.push('\n');
    out.push_str(code);
    out.push('\n');
    out.push_str(&fence);
    out.push_str("\n\n");
}

/// A fence must be longer than any run of its own character inside the code
fn fence_for(code: &str, fence: &str) -> String {
    let Some(fence_char) = fence.chars().next() else {
        return "```".to_string();
    };
    let longest = longest_run(code, fence_char);
    let len = fence.chars().count();
    if longest >= len {
        fence_char.to_string().repeat(longest + 1)
    } else {
        fence.to_string()
    }
}

fn longest_run(text: &str, target: char) -> usize {
    text.chars()
        .fold((0, 0), |(max, current), c| {
            if c == target {
                (max.max(current + 1), current + 1)
            } else {
                (max, 0)
            }
        })
        .0
}

fn serialize_table(headers: &[Vec<Inline>], rows: &[Vec<Vec<Inline>>], options: &Options, out: &mut String) {
    let col_count = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    if col_count == 0 {
        return;
    }

    // Ragged rows are padded with empty cells
    let render_row = |cells: &[Vec<Inline>]| -> Vec<String> {
        (0..col_count)
            .map(|i| cells.get(i).map(|c| render_cell(c, options)).unwrap_or_default())
            .collect()
    };

    let header = render_row(headers);
    let body: Vec<Vec<String>> = rows.iter().map(|r| render_row(r.as_slice())).collect();

    let mut widths = vec![3usize; col_count];
    for row in std::iter::once(&header).chain(body.iter()) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    write_table_row(&header, &widths, out);

    out.push('|');
    for &width in &widths {
        out.push(' ');
        out.push_str(&"-".repeat(width));
        out.push_str(" |");
    }
    out.push('\n');

    for row in &body {
        write_table_row(row, &widths, out);
    }

    out.push('\n');
}

/// Cells are single-line and a bare `|` would end the cell early
fn render_cell(cell: &[Inline], options: &Options) -> String {
    render_inlines(cell, options)
        .replace('\n', " ")
        .trim()
        .replace('|', "\\|")
}

fn write_table_row(cells: &[String], widths: &[usize], out: &mut String) {
    out.push('|');
    for (cell, &width) in cells.iter().zip(widths) {
        out.push(' ');
        out.push_str(cell);
        let padding = width.saturating_sub(cell.chars().count());
        out.push_str(&" ".repeat(padding));
        out.push_str(" |");
    }
    out.push('\n');
}

/// Trim the spaces and newlines left over from collapsed whitespace
fn trim_paragraph(text: &str) -> &str {
    text.trim_matches(|c| c == ' ' || c == '\n')
}

fn render_inlines(inlines: &[Inline], options: &Options) -> String {
    let mut out = String::new();
    serialize_inlines(inlines, options, &mut out);
    out
}

fn serialize_inlines(inlines: &[Inline], options: &Options, out: &mut String) {
    for inline in inlines {
        serialize_inline(inline, options, out);
    }
}

fn serialize_inline(inline: &Inline, options: &Options, out: &mut String) {
    match inline {
        Inline::Text(text) => out.push_str(text),

        Inline::Strong(content) => {
            let inner = render_inlines(content, options);
            wrap_delimited(&inner, &options.strong_delimiter, out);
        }

        Inline::Emphasis(content) => {
            let inner = render_inlines(content, options);
            wrap_delimited(&inner, &options.em_delimiter.to_string(), out);
        }

        Inline::Code(code) => {
            if !code.is_empty() {
                let ticks = "`".repeat(longest_run(code, '`') + 1);
                let space = if code.starts_with('`') || code.ends_with('`') {
                    " "
                } else {
                    ""
                };
                out.push_str(&ticks);
                out.push_str(space);
                out.push_str(code);
                out.push_str(space);
                out.push_str(&ticks);
            }
        }

        Inline::Link {
            content,
            url,
            title,
        } => {
            if options.ignore_links {
                serialize_inlines(content, options, out);
                return;
            }
            out.push('[');
            serialize_inlines(content, options, out);
            out.push_str("](");
            out.push_str(url);
            push_title(title.as_deref(), out);
            out.push(')');
        }

        Inline::Image { alt, url, title } => {
            if options.ignore_images {
                return;
            }
            out.push_str("![");
            out.push_str(alt);
            out.push_str("](");
            out.push_str(url);
            push_title(title.as_deref(), out);
            out.push(')');
        }

        Inline::LineBreak => out.push_str("  \n"),
    }
}

/// Wrap content in delimiters, keeping surrounding spaces outside them
fn wrap_delimited(inner: &str, delimiter: &str, out: &mut String) {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return;
    }
    let leading = &inner[..inner.len() - inner.trim_start().len()];
    let trailing = &inner[inner.trim_end().len()..];

    out.push_str(leading);
    out.push_str(delimiter);
    out.push_str(trimmed);
    out.push_str(delimiter);
    out.push_str(trailing);
}

fn push_title(title: Option<&str>, out: &mut String) {
    if let Some(t) = title {
        out.push_str(" \"");
        out.push_str(t);
        out.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(block: &Block, options: &Options) -> String {
        serialize(block, options).trim_end_matches('\n').to_string()
    }

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_paragraph() {
        let block = Block::Paragraph(vec![text("Hello World")]);
        assert_eq!(serialize(&block, &Options::default()), "Hello World\n\n");
    }

    #[test]
    fn test_paragraph_trims_collapsed_spaces() {
        let block = Block::Paragraph(vec![text(" Hello "), text("World ")]);
        assert_eq!(render(&block, &Options::default()), "Hello World");
    }

    #[test]
    fn test_heading_atx() {
        let block = Block::Heading {
            level: 3,
            content: vec![text("Section")],
        };
        assert_eq!(render(&block, &Options::default()), "### Section");
    }

    #[test]
    fn test_strong_and_emphasis() {
        let block = Block::Paragraph(vec![
            Inline::Strong(vec![text("bold")]),
            text(" and"),
            Inline::Emphasis(vec![text(" italic ")]),
            text("text"),
        ]);
        assert_eq!(render(&block, &Options::default()), "**bold** and *italic* text");
    }

    #[test]
    fn test_empty_strong_is_dropped() {
        let block = Block::Paragraph(vec![text("a"), Inline::Strong(vec![text("  ")]), text("b")]);
        assert_eq!(render(&block, &Options::default()), "ab");
    }

    #[test]
    fn test_inline_code_with_backticks() {
        let block = Block::Paragraph(vec![Inline::Code("a `b` c".to_string())]);
        assert_eq!(render(&block, &Options::default()), "``a `b` c``");

        let block = Block::Paragraph(vec![Inline::Code("`edge".to_string())]);
        assert_eq!(render(&block, &Options::default()), "`` `edge ``");
    }

    #[test]
    fn test_link_and_image() {
        let block = Block::Paragraph(vec![
            Inline::Link {
                content: vec![text("Example")],
                url: "https://example.com".to_string(),
                title: Some("Site".to_string()),
            },
            text(" "),
            Inline::Image {
                alt: "Alt".to_string(),
                url: "image.png".to_string(),
                title: None,
            },
        ]);
        assert_eq!(
            render(&block, &Options::default()),
            "[Example](https://example.com \"Site\") ![Alt](image.png)"
        );
    }

    #[test]
    fn test_ignore_links_and_images() {
        let options = Options {
            ignore_links: true,
            ignore_images: true,
            ..Default::default()
        };
        let block = Block::Paragraph(vec![
            Inline::Link {
                content: vec![text("Example")],
                url: "https://example.com".to_string(),
                title: None,
            },
            Inline::Image {
                alt: "Alt".to_string(),
                url: "image.png".to_string(),
                title: None,
            },
        ]);
        assert_eq!(render(&block, &options), "Example");
    }

    #[test]
    fn test_text_is_not_escaped() {
        let block = Block::Paragraph(vec![text("[world](https://ex.com/p) *raw* #1")]);
        assert_eq!(
            render(&block, &Options::default()),
            "[world](https://ex.com/p) *raw* #1"
        );
    }

    #[test]
    fn test_code_block_fenced() {
        let block = Block::CodeBlock {
            language: Some("rust".to_string()),
            code: "let x = 1;\n".to_string(),
        };
        assert_eq!(render(&block, &Options::default()), "```rust\nlet x = 1;\n```");
    }

    #[test]
    fn test_code_block_fence_grows() {
        let block = Block::CodeBlock {
            language: None,
            code: "```\nnested\n```".to_string(),
        };
        assert_eq!(
            render(&block, &Options::default()),
            "````\n```\nnested\n```\n````"
        );
    }

    #[test]
    fn test_blockquote() {
        let block = Block::BlockQuote(vec![
            Block::Paragraph(vec![text("One")]),
            Block::Paragraph(vec![text("Two")]),
        ]);
        assert_eq!(render(&block, &Options::default()), "> One\n>\n> Two");
    }

    #[test]
    fn test_unordered_list() {
        let block = Block::List {
            ordered: false,
            start: 1,
            items: vec![
                ListItem::from_inlines(vec![text("One")]),
                ListItem::from_inlines(vec![text("Two")]),
            ],
        };
        assert_eq!(render(&block, &Options::default()), "* One\n* Two");
    }

    #[test]
    fn test_ordered_list_start() {
        let block = Block::List {
            ordered: true,
            start: 9,
            items: vec![
                ListItem::from_inlines(vec![text("Nine")]),
                ListItem::from_inlines(vec![text("Ten")]),
            ],
        };
        assert_eq!(render(&block, &Options::default()), "9. Nine\n10. Ten");
    }

    #[test]
    fn test_nested_list() {
        let inner = Block::List {
            ordered: false,
            start: 1,
            items: vec![ListItem::from_inlines(vec![text("Child")])],
        };
        let block = Block::List {
            ordered: true,
            start: 1,
            items: vec![
                ListItem::new(vec![Block::Paragraph(vec![text("Parent")]), inner]),
                ListItem::from_inlines(vec![text("Sibling")]),
            ],
        };
        assert_eq!(
            render(&block, &Options::default()),
            "1. Parent\n   * Child\n2. Sibling"
        );
    }

    #[test]
    fn test_thematic_break() {
        assert_eq!(render(&Block::ThematicBreak, &Options::default()), "* * *");
    }

    #[test]
    fn test_table() {
        let block = Block::Table {
            headers: vec![vec![text("Name")], vec![text("Qty")]],
            rows: vec![
                vec![vec![text("Apple")], vec![text("3")]],
                vec![vec![text("Kiwi")]],
            ],
        };
        assert_eq!(
            render(&block, &Options::default()),
            "| Name  | Qty |\n| ----- | --- |\n| Apple | 3   |\n| Kiwi  |     |"
        );
    }

    #[test]
    fn test_table_cell_pipes_escaped() {
        let block = Block::Table {
            headers: vec![vec![text("Expr")]],
            rows: vec![vec![vec![text("x | y")]]],
        };
        assert_eq!(
            render(&block, &Options::default()),
            "| Expr   |\n| ------ |\n| x \\| y |"
        );
    }

    #[test]
    fn test_pipes_outside_tables_untouched() {
        let block = Block::Paragraph(vec![text("a | b")]);
        assert_eq!(render(&block, &Options::default()), "a | b");
    }

    #[test]
    fn test_document_skips_blank_blocks() {
        let block = Block::Document(vec![
            Block::Paragraph(vec![text("  ")]),
            Block::Heading {
                level: 2,
                content: vec![text("Title")],
            },
            Block::Paragraph(vec![text("Body")]),
        ]);
        assert_eq!(render(&block, &Options::default()), "## Title\n\nBody");
    }
}
