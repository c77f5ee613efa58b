//! Parser for slide markup → `SlideTree`.
//!
//! Built on `winnow` 0.7. Accepts the HTML subset generated slides use:
//! elements with quoted, unquoted or bare attributes, inline `style`
//! declarations, text with entities, comments, doctype/processing
//! instructions (skipped), `<img>`/`<br>` void elements and raw `<svg>`,
//! `<style>` and `<script>` subtrees.
//!
//! Editor overlays that leaked into the markup (handles, ghosts,
//! placeholders) are recognised by class and parsed into transient kinds so
//! they can be stripped.

use crate::css::apply_style_attribute;
use crate::id::{ANONYMOUS_PREFIX, NodeId};
use crate::model::*;
use petgraph::graph::NodeIndex;
use thiserror::Error;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// Markup that could not be turned into a slide tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected end of input inside <{tag}> opened at byte {offset}")]
    UnclosedElement { tag: String, offset: usize },

    #[error("closing tag </{found}> at byte {offset} does not match <{expected}>")]
    MismatchedClose {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("closing tag </{found}> at byte {offset} has no open element")]
    StrayClose { found: String, offset: usize },

    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },

    #[error("malformed tag at byte {offset}")]
    MalformedTag { offset: usize },
}

/// Elements that never have content.
const VOID_TAGS: &[&str] = &[
    "img", "br", "hr", "input", "meta", "link", "source", "wbr", "col", "area",
];

/// Elements whose content is captured verbatim.
const RAW_TAGS: &[&str] = &["svg", "style", "script"];

/// Elements that are text blocks even when empty.
const TEXT_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "span", "label", "blockquote", "a", "button",
    "td", "th", "figcaption", "b", "strong", "i", "em", "u", "small", "pre", "code",
];

/// Elements that may appear inside a text block's content.
const INLINE_TAGS: &[&str] = &[
    "span", "b", "strong", "i", "em", "u", "s", "strike", "del", "ins", "a", "br", "sup", "sub",
    "small", "mark", "code", "font", "img", "wbr",
];

/// Classes the editor gives its overlay elements.
const OVERLAY_CLASSES: &[(&str, Option<OverlayRole>)] = &[
    ("drag-handle", Some(OverlayRole::MoveHandle)),
    ("resize-handle", Some(OverlayRole::ResizeHandle)),
    ("drag-preview", Some(OverlayRole::Ghost)),
    ("svg-text-editor", Some(OverlayRole::TextInput)),
    ("svg-text-input", Some(OverlayRole::TextInput)),
    ("drag-placeholder", None),
];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Attribute carrying a serialized `RestoreRecord`.
pub const RESTORE_ATTR: &str = "data-restore";
/// Attribute carrying a serialized `SizeLockRecord`.
pub const SIZE_LOCK_ATTR: &str = "data-size-lock";
/// Marker attribute for aspect-locked nodes.
pub const KEEP_ASPECT_ATTR: &str = "data-keep-aspect";

/// Parse slide markup into a `SlideTree`.
///
/// Top-level elements become children of the canvas root.
///
/// # Errors
/// Returns a `ParseError` for unbalanced or malformed markup.
pub fn parse_slide(input: &str) -> Result<SlideTree, ParseError> {
    let mut rest = input;
    let mut cursor = Cursor { src: input };
    let (content, _) = cursor.parse_content(&mut rest, None)?;

    let mut tree = SlideTree::new();
    let mut builder = TreeBuilder { next_anon: 1 };
    let root = tree.root;
    for item in content {
        builder.insert(&mut tree, root, item);
    }
    log::debug!("parsed slide markup: {} nodes", tree.len());
    Ok(tree)
}

// ─── Markup tokens ──────────────────────────────────────────────────────

#[derive(Debug)]
enum Content<'a> {
    Element(Element<'a>),
    Text(&'a str),
}

#[derive(Debug)]
struct Element<'a> {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Content<'a>>,
    /// Verbatim inner markup.
    inner: &'a str,
}

impl Element<'_> {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }
}

struct Cursor<'a> {
    src: &'a str,
}

impl<'a> Cursor<'a> {
    fn offset(&self, input: &str) -> usize {
        self.src.len() - input.len()
    }

    /// Parse content until `closing` (or end of input at top level).
    /// Returns the items and the verbatim inner slice.
    fn parse_content(
        &mut self,
        input: &mut &'a str,
        closing: Option<(&str, usize)>,
    ) -> Result<(Vec<Content<'a>>, &'a str), ParseError> {
        let start = *input;
        let mut items = Vec::new();

        loop {
            if input.is_empty() {
                return match closing {
                    Some((tag, offset)) => Err(ParseError::UnclosedElement {
                        tag: tag.to_string(),
                        offset,
                    }),
                    None => Ok((items, start)),
                };
            }

            if input.starts_with("<!--") {
                let offset = self.offset(input);
                match input.find("-->") {
                    Some(end) => *input = &input[end + 3..],
                    None => return Err(ParseError::UnterminatedComment { offset }),
                }
                continue;
            }

            if input.starts_with("<!") || input.starts_with("<?") {
                skip_declaration(input);
                continue;
            }

            if input.starts_with("</") {
                let offset = self.offset(input);
                let inner = &start[..start.len() - input.len()];
                let found = parse_close_tag(input)
                    .map_err(|_| ParseError::MalformedTag { offset })?;
                return match closing {
                    Some((expected, _)) if expected.eq_ignore_ascii_case(&found) => {
                        Ok((items, inner))
                    }
                    Some((expected, _)) => Err(ParseError::MismatchedClose {
                        expected: expected.to_string(),
                        found,
                        offset,
                    }),
                    None => Err(ParseError::StrayClose { found, offset }),
                };
            }

            if starts_tag(input) {
                items.push(Content::Element(self.parse_element(input)?));
                continue;
            }

            // Text run up to the next tag; a lone '<' is literal text.
            let text = parse_text_run(input);
            if !text.is_empty() {
                items.push(Content::Text(text));
            }
        }
    }

    fn parse_element(&mut self, input: &mut &'a str) -> Result<Element<'a>, ParseError> {
        let offset = self.offset(input);
        let malformed = |_: winnow::error::ErrMode<ContextError>| ParseError::MalformedTag { offset };

        let _ = '<'.parse_next(input).map_err(malformed)?;
        let tag = parse_tag_name(input).map_err(malformed)?.to_ascii_lowercase();

        let mut attrs = Vec::new();
        let self_closing = loop {
            skip_ws(input);
            if input.starts_with("/>") {
                *input = &input[2..];
                break true;
            }
            if input.starts_with('>') {
                *input = &input[1..];
                break false;
            }
            if input.is_empty() {
                return Err(ParseError::UnclosedElement { tag, offset });
            }
            attrs.push(parse_attribute(input).map_err(malformed)?);
        };

        let mut element = Element {
            tag,
            attrs,
            children: Vec::new(),
            inner: "",
        };

        if self_closing || VOID_TAGS.contains(&element.tag.as_str()) {
            return Ok(element);
        }

        if RAW_TAGS.contains(&element.tag.as_str()) {
            element.inner = capture_raw(input, &element.tag).ok_or_else(|| {
                ParseError::UnclosedElement {
                    tag: element.tag.clone(),
                    offset,
                }
            })?;
            return Ok(element);
        }

        let (children, inner) = self.parse_content(input, Some((&element.tag, offset)))?;
        element.children = children;
        element.inner = inner;
        Ok(element)
    }
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn skip_ws(input: &mut &str) {
    let _ = take_while::<_, _, ContextError>(0.., char::is_whitespace).parse_next(input);
}

fn starts_tag(input: &str) -> bool {
    let mut chars = input.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn skip_declaration(input: &mut &str) {
    let _ = take_till::<_, _, ContextError>(0.., '>').parse_next(input);
    if input.starts_with('>') {
        *input = &input[1..];
    }
}

fn parse_tag_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-' || c == ':').parse_next(input)
}

fn parse_close_tag(input: &mut &str) -> ModalResult<String> {
    let _ = "</".parse_next(input)?;
    let name = parse_tag_name(input)?.to_ascii_lowercase();
    skip_ws(input);
    let _ = '>'.parse_next(input)?;
    Ok(name)
}

fn parse_text_run<'a>(input: &mut &'a str) -> &'a str {
    let start = *input;
    loop {
        let _ = take_till::<_, _, ContextError>(0.., '<').parse_next(input);
        if input.is_empty() || starts_tag(input) || input.starts_with("</") || input.starts_with("<!") {
            break;
        }
        // Literal '<' that does not open a tag.
        *input = &input[1..];
    }
    &start[..start.len() - input.len()]
}

fn parse_attribute(input: &mut &str) -> ModalResult<(String, String)> {
    let name: &str = take_while(1.., |c: char| {
        !c.is_whitespace() && c != '=' && c != '>' && c != '/' && c != '"' && c != '\''
    })
    .parse_next(input)?;
    let name = name.to_string();

    skip_ws(input);
    if !input.starts_with('=') {
        return Ok((name, String::new()));
    }
    *input = &input[1..];
    skip_ws(input);

    let raw: &str = if input.starts_with('"') {
        winnow::combinator::delimited('"', take_till(0.., '"'), '"').parse_next(input)?
    } else if input.starts_with('\'') {
        winnow::combinator::delimited('\'', take_till(0.., '\''), '\'').parse_next(input)?
    } else {
        take_while(1.., |c: char| !c.is_whitespace() && c != '>').parse_next(input)?
    };
    Ok((name, decode_entities(raw)))
}

/// Capture everything up to the matching `</tag>`, counting nested opens of
/// the same tag. Leaves the input after the closing tag.
fn capture_raw<'a>(input: &mut &'a str, tag: &str) -> Option<&'a str> {
    let start = *input;
    let lower = start.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}");

    let mut depth = 1usize;
    let mut pos = 0usize;
    while depth > 0 {
        let next_close = lower[pos..].find(&close)? + pos;
        let next_open = lower[pos..].find(&open).map(|i| i + pos);
        match next_open {
            Some(o) if o < next_close && tag == "svg" => {
                depth += 1;
                pos = o + open.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    let inner = &start[..next_close];
                    let after = &start[next_close..];
                    let gt = after.find('>')?;
                    *input = &after[gt + 1..];
                    return Some(inner);
                }
                pos = next_close + close.len();
            }
        }
    }
    None
}

/// Decode the character references that appear in attribute values.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';').filter(|&i| i <= 10) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ─── Tree construction ──────────────────────────────────────────────────

struct TreeBuilder {
    next_anon: u64,
}

impl TreeBuilder {
    fn fresh_id(&mut self, tree: &SlideTree) -> NodeId {
        loop {
            let id = NodeId::anonymous('n', self.next_anon);
            self.next_anon += 1;
            if !tree.contains(id) {
                return id;
            }
        }
    }

    fn insert(&mut self, tree: &mut SlideTree, parent: NodeIndex, item: Content<'_>) {
        match item {
            Content::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return;
                }
                let id = self.fresh_id(tree);
                let node = SlideNode::new(
                    id,
                    NodeKind::Text {
                        content: trimmed.to_string(),
                    },
                    TEXT_RUN_TAG,
                );
                tree.add_node(parent, node);
            }
            Content::Element(el) => {
                let kind = classify_element(&el);
                let descend = matches!(kind, NodeKind::Shape);
                let node = self.build_node(tree, &el, kind);
                let idx = tree.add_node(parent, node);
                if descend {
                    for child in el.children {
                        self.insert(tree, idx, child);
                    }
                }
            }
        }
    }

    fn build_node(&mut self, tree: &SlideTree, el: &Element<'_>, kind: NodeKind) -> SlideNode {
        let explicit = el
            .attr("id")
            .filter(|id| !id.is_empty() && !id.starts_with(ANONYMOUS_PREFIX))
            .map(NodeId::intern)
            .filter(|id| !tree.contains(*id));
        if explicit.is_none() && el.attr("id").is_some_and(|id| !id.is_empty()) {
            log::warn!("id {:?} is duplicated or reserved; kept as plain attribute", el.attr("id"));
        }
        let id = explicit.unwrap_or_else(|| self.fresh_id(tree));

        let mut node = SlideNode::new(id, kind, &el.tag);
        for (name, value) in &el.attrs {
            match name.to_ascii_lowercase().as_str() {
                "id" if explicit.is_some() => {}
                "style" => apply_style_attribute(&mut node, value),
                "src" if matches!(node.kind, NodeKind::Image { .. }) => {}
                KEEP_ASPECT_ATTR => node.aspect_locked = value != "false",
                "contenteditable" => node.editable = value.is_empty() || value == "true",
                RESTORE_ATTR => match serde_json::from_str::<RestoreRecord>(value) {
                    Ok(record) => node.restore = Some(record),
                    Err(e) => {
                        log::warn!("ignoring unreadable {RESTORE_ATTR} on {id}: {e}");
                        node.attrs.push((name.clone(), value.clone()));
                    }
                },
                SIZE_LOCK_ATTR => match serde_json::from_str::<SizeLockRecord>(value) {
                    Ok(record) => node.size_lock = Some(record),
                    Err(e) => {
                        log::warn!("ignoring unreadable {SIZE_LOCK_ATTR} on {id}: {e}");
                        node.attrs.push((name.clone(), value.clone()));
                    }
                },
                _ => node.attrs.push((name.clone(), value.clone())),
            }
        }
        node
    }
}

/// Decide the node kind of a parsed element.
fn classify_element(el: &Element<'_>) -> NodeKind {
    for (class, role) in OVERLAY_CLASSES {
        if el.has_class(class) {
            return match role {
                Some(role) => NodeKind::Overlay(*role),
                None => NodeKind::Placeholder,
            };
        }
    }

    match el.tag.as_str() {
        "img" => {
            return NodeKind::Image {
                src: el.attr("src").unwrap_or_default().to_string(),
            };
        }
        "svg" => {
            return NodeKind::Vector {
                source: el.inner.to_string(),
            };
        }
        "style" | "script" => {
            return NodeKind::Raw {
                source: el.inner.to_string(),
            };
        }
        _ => {}
    }

    let all_inline = el.children.iter().all(|c| match c {
        Content::Text(_) => true,
        Content::Element(child) => INLINE_TAGS.contains(&child.tag.as_str()),
    });
    let has_text = el.children.iter().any(|c| match c {
        Content::Text(t) => !t.trim().is_empty(),
        Content::Element(child) => {
            INLINE_TAGS.contains(&child.tag.as_str()) && !VOID_TAGS.contains(&child.tag.as_str())
        }
    });

    if all_inline && (has_text || TEXT_TAGS.contains(&el.tag.as_str())) {
        NodeKind::Text {
            content: el.inner.to_string(),
        }
    } else {
        NodeKind::Shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kind_of(tree: &SlideTree, id: &str) -> NodeKind {
        tree.get_by_id(NodeId::intern(id)).unwrap().kind.clone()
    }

    #[test]
    fn parse_text_block() {
        let tree = parse_slide(r#"<h1 id="title" style="font-size: 48px">Quarterly <b>Review</b></h1>"#)
            .unwrap();
        assert_eq!(
            kind_of(&tree, "title"),
            NodeKind::Text {
                content: "Quarterly <b>Review</b>".into()
            }
        );
        let node = tree.get_by_id(NodeId::intern("title")).unwrap();
        assert_eq!(node.style.font_size, Some(48.0));
    }

    #[test]
    fn parse_nested_shapes() {
        let tree = parse_slide(
            r#"<div id="card"><p id="card_body">Body</p><img id="card_img" src="a.png"></div>"#,
        )
        .unwrap();
        assert_eq!(kind_of(&tree, "card"), NodeKind::Shape);
        assert_eq!(
            kind_of(&tree, "card_img"),
            NodeKind::Image { src: "a.png".into() }
        );
        let card = tree.index_of(NodeId::intern("card")).unwrap();
        assert_eq!(tree.children(card).len(), 2);
    }

    #[test]
    fn anonymous_ids_for_unnamed_elements() {
        let tree = parse_slide("<div><p>one</p><p>two</p></div>").unwrap();
        assert_eq!(tree.len(), 3);
        for idx in tree.paint_order() {
            assert!(tree.graph[idx].id.is_anonymous());
        }
    }

    #[test]
    fn duplicate_id_is_kept_as_attribute() {
        let tree = parse_slide(r#"<p id="dup_x">a</p><p id="dup_x">b</p>"#).unwrap();
        let order = tree.children(tree.root);
        let second = &tree.graph[order[1]];
        assert!(second.id.is_anonymous());
        assert_eq!(second.attr("id"), Some("dup_x"));
    }

    #[test]
    fn svg_is_captured_raw() {
        let tree = parse_slide(
            r#"<svg id="chart" width="200" height="100"><svg><rect/></svg><text>x</text></svg><p id="after_svg">a</p>"#,
        )
        .unwrap();
        assert_eq!(
            kind_of(&tree, "chart"),
            NodeKind::Vector {
                source: "<svg><rect/></svg><text>x</text>".into()
            }
        );
        assert!(tree.contains(NodeId::intern("after_svg")));
    }

    #[test]
    fn overlays_are_recognised() {
        let tree = parse_slide(
            r#"<div class="drag-handle"></div><div class="drag-placeholder"></div><p id="real">x</p>"#,
        )
        .unwrap();
        let kinds: Vec<_> = tree
            .children(tree.root)
            .into_iter()
            .map(|i| tree.graph[i].kind.clone())
            .collect();
        assert_eq!(kinds[0], NodeKind::Overlay(OverlayRole::MoveHandle));
        assert_eq!(kinds[1], NodeKind::Placeholder);
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        let tree = parse_slide("<!DOCTYPE html><!-- note --><p id=\"c1\">x</p>").unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn attribute_forms() {
        let tree =
            parse_slide(r#"<img id="pic" src=a.png alt='A &amp; B' data-keep-aspect>"#).unwrap();
        let pic = tree.get_by_id(NodeId::intern("pic")).unwrap();
        assert!(pic.aspect_locked);
        assert_eq!(pic.attr("alt"), Some("A & B"));
        assert_eq!(pic.kind, NodeKind::Image { src: "a.png".into() });
    }

    #[test]
    fn mixed_content_gets_text_runs() {
        let tree = parse_slide("<div id=\"mix\">Intro <div>block</div></div>").unwrap();
        let mix = tree.index_of(NodeId::intern("mix")).unwrap();
        let first = &tree.graph[tree.children(mix)[0]];
        assert_eq!(first.tag, TEXT_RUN_TAG);
        assert_eq!(first.kind, NodeKind::Text { content: "Intro".into() });
    }

    #[test]
    fn mismatched_close_is_an_error() {
        let err = parse_slide("<div><p>x</div>").unwrap_err();
        assert!(matches!(err, ParseError::MismatchedClose { .. }));
    }

    #[test]
    fn unclosed_element_is_an_error() {
        let err = parse_slide("<div><p>x</p>").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnclosedElement {
                tag: "div".into(),
                offset: 0
            }
        );
    }

    #[test]
    fn stray_close_is_an_error() {
        assert!(matches!(
            parse_slide("</div>"),
            Err(ParseError::StrayClose { .. })
        ));
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let tree = parse_slide("<p id=\"lt\">1 < 2</p>").unwrap();
        assert_eq!(kind_of(&tree, "lt"), NodeKind::Text { content: "1 < 2".into() });
    }

    #[test]
    fn decode_numeric_entities() {
        assert_eq!(decode_entities("&#65;&#x42;&lt;"), "AB<");
        assert_eq!(decode_entities("a & b"), "a & b");
    }
}
