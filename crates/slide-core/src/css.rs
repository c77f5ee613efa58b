//! Inline `style` attribute handling.
//!
//! Declarations the editor manipulates are lifted into typed fields on the
//! node (`Style`, `BoxModel`, `Positioning`, `SizeSpec`); everything else is
//! kept verbatim in `Style::extra` and written back after the typed ones.

use crate::model::*;

/// Split a declaration block on `;`, ignoring separators inside parentheses
/// or quotes (`url(data:...;base64)`, `font-family: "a;b"`).
pub fn split_declarations(block: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in block.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                push_declaration(&mut out, &block[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_declaration(&mut out, &block[start..]);
    out
}

fn push_declaration(out: &mut Vec<(String, String)>, decl: &str) {
    let Some((name, value)) = decl.split_once(':') else {
        return;
    };
    let name = name.trim().to_ascii_lowercase();
    let value = value.trim();
    if name.is_empty() || value.is_empty() {
        return;
    }
    out.push((name, value.to_string()));
}

/// Parse a pixel length. Bare numbers are accepted as pixels.
pub fn parse_px(value: &str) -> Option<f32> {
    let v = value.trim();
    let num = v.strip_suffix("px").unwrap_or(v).trim();
    num.parse::<f32>().ok().filter(|n| n.is_finite())
}

/// Parse a 1–4 value box shorthand (`margin`, `padding`).
pub fn parse_edges(value: &str) -> Option<Edges> {
    let parts: Vec<f32> = value
        .split_whitespace()
        .map(parse_px)
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [a] => Some(Edges::uniform(*a)),
        [v, h] => Some(Edges {
            top: *v,
            right: *h,
            bottom: *v,
            left: *h,
        }),
        [t, h, b] => Some(Edges {
            top: *t,
            right: *h,
            bottom: *b,
            left: *h,
        }),
        [t, r, b, l] => Some(Edges {
            top: *t,
            right: *r,
            bottom: *b,
            left: *l,
        }),
        _ => None,
    }
}

/// Width of a `border` shorthand (`1px solid #000` → 1). Non-pixel or
/// missing widths count as zero; `none` is zero.
pub fn border_width(border: Option<&str>) -> f32 {
    border
        .and_then(|b| b.split_whitespace().find_map(parse_px))
        .unwrap_or(0.0)
}

/// Format a pixel value the way the emitter writes it (`12px`, `12.5px`).
pub fn format_px(v: f32) -> String {
    format!("{}px", format_num(v))
}

pub fn format_num(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{rounded:.2}");
        s.trim_end_matches('0').to_string()
    }
}

fn format_edges(e: &Edges) -> String {
    if e.top == e.right && e.top == e.bottom && e.top == e.left {
        format_px(e.top)
    } else {
        format!(
            "{} {} {} {}",
            format_px(e.top),
            format_px(e.right),
            format_px(e.bottom),
            format_px(e.left)
        )
    }
}

fn parse_box_sizing(v: &str) -> Option<BoxSizing> {
    match v {
        "border-box" => Some(BoxSizing::BorderBox),
        "content-box" => Some(BoxSizing::ContentBox),
        _ => None,
    }
}

pub fn box_sizing_css(b: BoxSizing) -> &'static str {
    match b {
        BoxSizing::BorderBox => "border-box",
        BoxSizing::ContentBox => "content-box",
    }
}

fn parse_font_weight(v: &str) -> Option<u16> {
    match v {
        "normal" => Some(400),
        "bold" | "bolder" => Some(700),
        "lighter" => Some(300),
        _ => v.parse::<u16>().ok(),
    }
}

fn parse_text_align(v: &str) -> Option<TextAlign> {
    match v {
        "left" | "start" => Some(TextAlign::Left),
        "center" => Some(TextAlign::Center),
        "right" | "end" => Some(TextAlign::Right),
        "justify" => Some(TextAlign::Justify),
        _ => None,
    }
}

fn parse_object_fit(v: &str) -> Option<ObjectFit> {
    match v {
        "fill" => Some(ObjectFit::Fill),
        "contain" => Some(ObjectFit::Contain),
        "cover" => Some(ObjectFit::Cover),
        "none" => Some(ObjectFit::None),
        "scale-down" => Some(ObjectFit::ScaleDown),
        _ => None,
    }
}

fn parse_decoration(v: &str) -> Option<TextDecoration> {
    let mut deco = TextDecoration::default();
    for token in v.split_whitespace() {
        match token {
            "underline" => deco.underline = true,
            "line-through" => deco.line_through = true,
            "none" => {}
            // Colors or styles in the shorthand are not modelled.
            _ => return None,
        }
    }
    Some(deco)
}

/// Apply the declarations of a `style` attribute to a node.
pub fn apply_style_attribute(node: &mut SlideNode, block: &str) {
    let decls = split_declarations(block);

    let absolute = decls
        .iter()
        .any(|(k, v)| k == "position" && v.eq_ignore_ascii_case("absolute"));
    let (mut left, mut top) = (0.0, 0.0);

    for (name, value) in decls {
        let v = value.as_str();
        let consumed = match name.as_str() {
            "position" if absolute => true,
            "left" if absolute => parse_px(v).map(|px| left = px).is_some(),
            "top" if absolute => parse_px(v).map(|px| top = px).is_some(),

            "width" => set_len(&mut node.size.width, v),
            "height" => set_len(&mut node.size.height, v),
            "min-width" => set_len(&mut node.size.min_width, v),
            "min-height" => set_len(&mut node.size.min_height, v),
            "max-width" => set_len(&mut node.size.max_width, v),
            "max-height" => set_len(&mut node.size.max_height, v),

            "margin" => set_edges(&mut node.box_model.margin, v),
            "padding" => set_edges(&mut node.box_model.padding, v),
            "margin-top" => set_side(&mut node.box_model.margin.top, v),
            "margin-right" => set_side(&mut node.box_model.margin.right, v),
            "margin-bottom" => set_side(&mut node.box_model.margin.bottom, v),
            "margin-left" => set_side(&mut node.box_model.margin.left, v),
            "padding-top" => set_side(&mut node.box_model.padding.top, v),
            "padding-right" => set_side(&mut node.box_model.padding.right, v),
            "padding-bottom" => set_side(&mut node.box_model.padding.bottom, v),
            "padding-left" => set_side(&mut node.box_model.padding.left, v),
            "border" => {
                node.box_model.border = Some(value.clone());
                true
            }
            "box-sizing" => parse_box_sizing(v)
                .map(|b| node.box_model.box_sizing = Some(b))
                .is_some(),
            "overflow" => {
                node.box_model.overflow = Some(value.clone());
                true
            }
            "white-space" => {
                node.box_model.white_space = Some(value.clone());
                true
            }

            "font-family" => {
                node.style.font_family = Some(value.clone());
                true
            }
            "font-size" => parse_px(v).map(|px| node.style.font_size = Some(px)).is_some(),
            "font-weight" => parse_font_weight(v)
                .map(|w| node.style.font_weight = Some(w))
                .is_some(),
            "font-style" => match v {
                "italic" | "oblique" => {
                    node.style.font_style = Some(FontStyle::Italic);
                    true
                }
                "normal" => {
                    node.style.font_style = Some(FontStyle::Normal);
                    true
                }
                _ => false,
            },
            "line-height" => {
                node.style.line_height = Some(value.clone());
                true
            }
            "color" => {
                node.style.color = Some(value.clone());
                true
            }
            "background-color" => {
                node.style.background = Some(value.clone());
                true
            }
            "text-decoration" | "text-decoration-line" => parse_decoration(v)
                .map(|d| node.style.decoration = d)
                .is_some(),
            "text-align" => parse_text_align(v)
                .map(|a| node.style.text_align = Some(a))
                .is_some(),
            "object-fit" => parse_object_fit(v)
                .map(|f| node.style.object_fit = Some(f))
                .is_some(),
            "object-position" => {
                node.style.object_position = Some(value.clone());
                true
            }
            "z-index" => v.parse::<i32>().map(|z| node.style.z_index = Some(z)).is_ok(),
            "outline" => {
                node.style.outline = Some(value.clone());
                true
            }
            "visibility" if v == "hidden" => {
                node.style.hidden = true;
                true
            }
            _ => false,
        };

        if !consumed {
            node.style.extra.push((name, value));
        }
    }

    if absolute {
        node.position = Positioning::Absolute { left, top };
    }
}

fn set_len(slot: &mut Option<f32>, v: &str) -> bool {
    if v == "auto" || v == "none" {
        *slot = None;
        return true;
    }
    parse_px(v).map(|px| *slot = Some(px)).is_some()
}

fn set_edges(slot: &mut Edges, v: &str) -> bool {
    parse_edges(v).map(|e| *slot = e).is_some()
}

fn set_side(slot: &mut f32, v: &str) -> bool {
    parse_px(v).map(|px| *slot = px).is_some()
}

/// Declarations for a node in canonical order, ready for a `style` attribute.
pub fn style_declarations(node: &SlideNode) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    let mut push = |k: &str, v: String| out.push((k.to_string(), v));

    if let Positioning::Absolute { left, top } = node.position {
        push("position", "absolute".into());
        push("left", format_px(left));
        push("top", format_px(top));
    }
    if let Some(z) = node.style.z_index {
        push("z-index", z.to_string());
    }

    let size = &node.size;
    for (key, value) in [
        ("width", size.width),
        ("height", size.height),
        ("min-width", size.min_width),
        ("min-height", size.min_height),
        ("max-width", size.max_width),
        ("max-height", size.max_height),
    ] {
        if let Some(v) = value {
            push(key, format_px(v));
        }
    }

    let bm = &node.box_model;
    if !bm.margin.is_zero() {
        push("margin", format_edges(&bm.margin));
    }
    if !bm.padding.is_zero() {
        push("padding", format_edges(&bm.padding));
    }
    if let Some(border) = &bm.border {
        push("border", border.clone());
    }
    if let Some(b) = bm.box_sizing {
        push("box-sizing", box_sizing_css(b).into());
    }
    if let Some(o) = &bm.overflow {
        push("overflow", o.clone());
    }
    if let Some(w) = &bm.white_space {
        push("white-space", w.clone());
    }

    let st = &node.style;
    if let Some(f) = &st.font_family {
        push("font-family", f.clone());
    }
    if let Some(s) = st.font_size {
        push("font-size", format_px(s));
    }
    if let Some(w) = st.font_weight {
        let v = match w {
            400 => "normal".to_string(),
            700 => "bold".to_string(),
            other => other.to_string(),
        };
        push("font-weight", v);
    }
    if let Some(fs) = st.font_style {
        let v = match fs {
            FontStyle::Italic => "italic",
            FontStyle::Normal => "normal",
        };
        push("font-style", v.into());
    }
    if let Some(lh) = &st.line_height {
        push("line-height", lh.clone());
    }
    if let Some(c) = &st.color {
        push("color", c.clone());
    }
    if let Some(bg) = &st.background {
        push("background-color", bg.clone());
    }
    match (st.decoration.underline, st.decoration.line_through) {
        (true, true) => push("text-decoration", "underline line-through".into()),
        (true, false) => push("text-decoration", "underline".into()),
        (false, true) => push("text-decoration", "line-through".into()),
        (false, false) => {}
    }
    if let Some(a) = st.text_align {
        push("text-align", a.as_css().into());
    }
    if let Some(f) = st.object_fit {
        push("object-fit", f.as_css().into());
    }
    if let Some(p) = &st.object_position {
        push("object-position", p.clone());
    }
    if let Some(o) = &st.outline {
        push("outline", o.clone());
    }
    if st.hidden {
        push("visibility", "hidden".into());
    }

    // Pass-through declarations never override a typed one.
    for (k, v) in &st.extra {
        if !out.iter().any(|(known, _)| known == k) {
            out.push((k.clone(), v.clone()));
        }
    }
    out
}

/// Serialize declarations as `a: b; c: d`.
pub fn format_style_attribute(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Drop pass-through declarations matching a property prefix
/// (`"margin"` removes `margin-inline`, ...).
pub fn remove_extra(style: &mut Style, prefix: &str) {
    style.extra.retain(|(k, _)| !k.starts_with(prefix));
}
