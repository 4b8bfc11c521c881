//! Convert the filtered document tree to the Markdown AST
//!
//! Text reaching this stage is emitted as-is: image and link tokens written
//! by the rewriters are plain text nodes by now.

use once_cell::sync::Lazy;
use pagemd_core::{Block, Inline, ListItem};
use regex::Regex;

use crate::dom::{Document, NodeId, NodeType};
use crate::{Result, TransformError};

/// Deepest element nesting the converter descends into
pub const MAX_DEPTH: usize = 512;

/// HTML whitespace only, so NBSP and other Unicode spaces survive
static HTML_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\n\r\x0C]+").expect("valid whitespace regex"));

/// Elements that take part in the surrounding inline run
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "button", "cite", "code", "data", "del", "dfn", "em",
    "font", "i", "img", "input", "ins", "kbd", "label", "mark", "q", "s", "samp", "small", "span",
    "strike", "strong", "sub", "sup", "time", "tt", "u", "var", "wbr",
];

/// Elements with no readable content
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "title", "meta", "link", "base", "template", "noscript", "iframe", "object", "embed",
];

/// Convert the children of `root` to a Markdown document
pub fn convert(doc: &Document, root: NodeId) -> Result<Block> {
    let blocks = convert_children(doc, root, Context::default())?;
    Ok(Block::Document(blocks))
}

#[derive(Default, Clone, Copy)]
struct Context {
    depth: usize,
    /// Content must stay on one line (headings and table cells)
    single_line: bool,
}

impl Context {
    fn descend(self, node: NodeId) -> Result<Self> {
        if self.depth >= MAX_DEPTH {
            return Err(TransformError::Conversion(format!(
                "element {node} is nested deeper than {MAX_DEPTH} levels"
            )));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }

    fn one_line(self) -> Self {
        Self {
            single_line: true,
            ..self
        }
    }
}

/// Convert children to blocks, gathering inline runs into paragraphs
fn convert_children(doc: &Document, node: NodeId, ctx: Context) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    let mut run: Vec<Inline> = Vec::new();

    for &child in doc.children(node) {
        let Some(child_node) = doc.get(child) else {
            continue;
        };

        match child_node.node_type {
            NodeType::Text => push_text(&mut run, child_node.node_value.as_deref().unwrap_or("")),
            NodeType::Element if is_inline(child_node.tag_name()) => {
                inline_element(doc, child, ctx, &mut run)?;
            }
            NodeType::Element => {
                flush_paragraph(&mut run, &mut blocks);
                match convert_element(doc, child, ctx)? {
                    Some(Block::Document(inner)) => blocks.extend(inner),
                    Some(block) => blocks.push(block),
                    None => {}
                }
            }
            _ => {}
        }
    }

    flush_paragraph(&mut run, &mut blocks);
    Ok(blocks)
}

fn flush_paragraph(run: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    let inlines = std::mem::take(run);
    if !inlines_are_blank(&inlines) {
        blocks.push(Block::Paragraph(inlines));
    }
}

/// Convert a block-level element
fn convert_element(doc: &Document, node: NodeId, ctx: Context) -> Result<Option<Block>> {
    let ctx = ctx.descend(node)?;
    let tag = doc.tag_name(node).unwrap_or_default();

    let block = match tag {
        "p" => {
            let inlines = collect_inlines(doc, node, ctx)?;
            (!inlines_are_blank(&inlines)).then_some(Block::Paragraph(inlines))
        }

        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse().unwrap_or(1);
            let content = collect_inlines(doc, node, ctx.one_line())?;
            (!inlines_are_blank(&content)).then_some(Block::Heading { level, content })
        }

        "blockquote" => {
            let blocks = convert_children(doc, node, ctx)?;
            (!blocks.is_empty()).then_some(Block::BlockQuote(blocks))
        }

        "ul" | "ol" => {
            let ordered = tag == "ol";
            let start = doc
                .attr(node, "start")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1);
            let items = collect_list_items(doc, node, ctx)?;
            (!items.is_empty()).then_some(Block::List {
                ordered,
                start,
                items,
            })
        }

        "pre" => {
            let code = doc.text_content(node);
            (!code.trim().is_empty()).then(|| Block::CodeBlock {
                language: code_language(doc, node),
                code,
            })
        }

        "hr" => Some(Block::ThematicBreak),

        "table" => convert_table(doc, node, ctx)?,

        _ if SKIPPED_ELEMENTS.contains(&tag) => None,

        // Containers and unknown elements
        _ => {
            let blocks = convert_children(doc, node, ctx)?;
            match blocks.len() {
                0 => None,
                1 => blocks.into_iter().next(),
                _ => Some(Block::Document(blocks)),
            }
        }
    };

    Ok(block)
}

/// `language-*` class on the inner `code` element, or on the `pre` itself
fn code_language(doc: &Document, pre: NodeId) -> Option<String> {
    let code = doc
        .element_children(pre)
        .find(|&c| doc.tag_name(c) == Some("code"));

    code.into_iter()
        .chain(std::iter::once(pre))
        .filter_map(|n| doc.attr(n, "class"))
        .flat_map(str::split_whitespace)
        .find_map(|class| class.strip_prefix("language-"))
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

/// Collect list items from ul/ol
fn collect_list_items(doc: &Document, node: NodeId, ctx: Context) -> Result<Vec<ListItem>> {
    let mut items = Vec::new();

    for li in doc.element_children(node) {
        if doc.tag_name(li) != Some("li") {
            continue;
        }
        let ctx = ctx.descend(li)?;
        items.push(ListItem::new(convert_children(doc, li, ctx)?));
    }

    Ok(items)
}

/// Convert a table element
fn convert_table(doc: &Document, node: NodeId, ctx: Context) -> Result<Option<Block>> {
    let mut caption: Option<Vec<Inline>> = None;
    let mut headers: Vec<Vec<Inline>> = Vec::new();
    let mut rows: Vec<Vec<Vec<Inline>>> = Vec::new();

    let mut row_elements = Vec::new();
    for child in doc.element_children(node) {
        match doc.tag_name(child) {
            Some("caption") => caption = Some(collect_inlines(doc, child, ctx)?),
            Some("thead") | Some("tbody") | Some("tfoot") => row_elements.extend(
                doc.element_children(child)
                    .filter(|&tr| doc.tag_name(tr) == Some("tr")),
            ),
            Some("tr") => row_elements.push(child),
            _ => {}
        }
    }

    for tr in row_elements {
        let ctx = ctx.descend(tr)?;
        let mut row = Vec::new();
        let mut all_headers = true;

        for cell in doc.element_children(tr) {
            let tag = doc.tag_name(cell);
            if tag != Some("th") && tag != Some("td") {
                continue;
            }
            all_headers &= tag == Some("th");
            let inlines = collect_inlines(doc, cell, ctx.descend(cell)?.one_line())?;
            row.push(single_line(inlines));
        }

        if row.is_empty() {
            continue;
        }
        if all_headers && headers.is_empty() && rows.is_empty() {
            headers = row;
        } else {
            rows.push(row);
        }
    }

    if headers.is_empty() && !rows.is_empty() {
        headers = rows.remove(0);
    }

    let mut blocks = Vec::new();
    if let Some(caption) = caption.filter(|c| !inlines_are_blank(c)) {
        blocks.push(Block::Paragraph(caption));
    }
    if !headers.is_empty() {
        blocks.push(Block::Table { headers, rows });
    }

    Ok(match blocks.len() {
        0 => None,
        1 => blocks.pop(),
        _ => Some(Block::Document(blocks)),
    })
}

/// Table cells cannot hold line breaks
fn single_line(inlines: Vec<Inline>) -> Vec<Inline> {
    inlines
        .into_iter()
        .map(|inline| match inline {
            Inline::LineBreak => Inline::Text(" ".to_string()),
            other => other,
        })
        .collect()
}

/// Collect inline content from all children of a node
fn collect_inlines(doc: &Document, node: NodeId, ctx: Context) -> Result<Vec<Inline>> {
    let mut inlines = Vec::new();

    for &child in doc.children(node) {
        let Some(child_node) = doc.get(child) else {
            continue;
        };
        match child_node.node_type {
            NodeType::Text => {
                push_text(&mut inlines, child_node.node_value.as_deref().unwrap_or(""))
            }
            NodeType::Element => inline_element(doc, child, ctx, &mut inlines)?,
            _ => {}
        }
    }

    Ok(inlines)
}

/// Convert an element in inline context, appending to `out`
fn inline_element(
    doc: &Document,
    node: NodeId,
    ctx: Context,
    out: &mut Vec<Inline>,
) -> Result<()> {
    let ctx = ctx.descend(node)?;
    let tag = doc.tag_name(node).unwrap_or_default();

    match tag {
        "strong" | "b" => {
            let inner = collect_inlines(doc, node, ctx)?;
            if inlines_are_blank(&inner) {
                append_run(out, inner);
            } else {
                push_inline(out, Inline::Strong(inner));
            }
        }

        "em" | "i" => {
            let inner = collect_inlines(doc, node, ctx)?;
            if inlines_are_blank(&inner) {
                append_run(out, inner);
            } else {
                push_inline(out, Inline::Emphasis(inner));
            }
        }

        "code" | "kbd" | "samp" | "tt" => {
            let text = collapse_whitespace(&doc.text_content(node));
            if !text.trim().is_empty() {
                push_inline(out, Inline::Code(text));
            }
        }

        "a" => {
            let content = collect_inlines(doc, node, ctx)?;
            match doc.attr(node, "href") {
                Some(href) => push_inline(
                    out,
                    Inline::Link {
                        content,
                        url: href.to_string(),
                        title: doc.attr(node, "title").map(str::to_string),
                    },
                ),
                None => append_run(out, content),
            }
        }

        "img" => {
            if let Some(src) = doc.attr(node, "src") {
                push_inline(
                    out,
                    Inline::Image {
                        alt: doc.attr(node, "alt").unwrap_or_default().to_string(),
                        url: src.to_string(),
                        title: doc.attr(node, "title").map(str::to_string),
                    },
                );
            }
        }

        "br" if ctx.single_line => push_inline(out, Inline::Text(" ".to_string())),
        "br" => push_inline(out, Inline::LineBreak),

        _ if SKIPPED_ELEMENTS.contains(&tag) => {}

        "pre" => {
            let text = doc.text_content(node);
            if !text.trim().is_empty() {
                push_inline(out, Inline::Code(collapse_whitespace(&text)));
            }
        }

        // Anything else is flattened into the run; block elements keep a
        // boundary on both sides
        _ => {
            let block = !is_inline(tag);
            if block {
                push_boundary(out, ctx);
            }
            append_run(out, collect_inlines(doc, node, ctx)?);
            if block {
                push_boundary(out, ctx);
            }
        }
    }

    Ok(())
}

/// Append text, collapsing whitespace across the boundary with the previous text
fn push_text(out: &mut Vec<Inline>, raw: &str) {
    let text = collapse_whitespace(raw);
    if text.is_empty() {
        return;
    }
    push_inline(out, Inline::Text(text));
}

/// Separate flattened block content: a space on single lines, a line break elsewhere
fn push_boundary(out: &mut Vec<Inline>, ctx: Context) {
    if ctx.single_line {
        push_inline(out, Inline::Text(" ".to_string()));
    } else if !matches!(out.last(), Some(Inline::LineBreak)) {
        push_inline(out, Inline::LineBreak);
    }
}

/// Flatten a nested run into `out` without doubling a boundary line break
fn append_run(out: &mut Vec<Inline>, inner: Vec<Inline>) {
    let mut inner = inner.into_iter().peekable();
    if matches!(out.last(), Some(Inline::LineBreak)) {
        while inner.next_if(|i| matches!(i, Inline::LineBreak)).is_some() {}
    }
    for inline in inner {
        push_inline(out, inline);
    }
}

fn push_inline(out: &mut Vec<Inline>, inline: Inline) {
    match inline {
        Inline::Text(text) => match out.last_mut() {
            Some(Inline::Text(prev)) => {
                let text = if prev.ends_with(' ') {
                    text.trim_start_matches(' ')
                } else {
                    text.as_str()
                };
                prev.push_str(text);
            }
            Some(Inline::LineBreak) => {
                let text = text.trim_start_matches(' ');
                if !text.is_empty() {
                    out.push(Inline::Text(text.to_string()));
                }
            }
            _ => out.push(Inline::Text(text)),
        },
        Inline::LineBreak => {
            if let Some(Inline::Text(prev)) = out.last_mut() {
                let len = prev.trim_end_matches(' ').len();
                prev.truncate(len);
            }
            out.push(Inline::LineBreak);
        }
        other => out.push(other),
    }
}

/// Check if inlines are all blank
fn inlines_are_blank(inlines: &[Inline]) -> bool {
    inlines.iter().all(|i| i.is_blank())
}

fn is_inline(tag: &str) -> bool {
    INLINE_ELEMENTS.contains(&tag)
}

/// Collapse runs of HTML whitespace to a single space
fn collapse_whitespace(s: &str) -> String {
    HTML_WHITESPACE.replace_all(s, " ").into_owned()
}
