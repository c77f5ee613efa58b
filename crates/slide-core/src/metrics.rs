//! Text measurement.
//!
//! Layout and the text editor only need line heights, run widths and a
//! point → character mapping. Hosts with real font metrics implement
//! `TextMetrics`; `ApproxMetrics` is a deterministic fallback used in tests
//! and headless runs.

use crate::model::Style;
use crate::parser::decode_entities;

/// One wrapped line, as a char range into the plain text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineBox {
    pub start: usize,
    pub end: usize,
    pub width: f32,
}

pub trait TextMetrics {
    /// Height of one line box.
    fn line_height(&self, style: &Style) -> f32;

    /// Advance width of an unwrapped run of plain text.
    fn text_width(&self, text: &str, style: &Style) -> f32;

    /// Greedy word wrap of plain text. Explicit newlines always break.
    fn wrap(&self, text: &str, style: &Style, max_width: Option<f32>) -> Vec<LineBox> {
        let chars: Vec<char> = text.chars().collect();
        let width_of = |a: usize, b: usize| -> f32 {
            self.text_width(&chars[a..b].iter().collect::<String>(), style)
        };

        let mut lines = Vec::new();
        let mut para_start = 0;
        loop {
            let para_end = chars[para_start..]
                .iter()
                .position(|&c| c == '\n')
                .map_or(chars.len(), |p| para_start + p);

            let mut line_start = para_start;
            let mut last_space: Option<usize> = None;
            let mut j = para_start;
            while j < para_end {
                if chars[j] == ' ' {
                    last_space = Some(j);
                }
                if let Some(max) = max_width
                    && j > line_start
                    && width_of(line_start, j + 1) > max
                {
                    let brk = last_space.filter(|&s| s > line_start).unwrap_or(j);
                    lines.push(LineBox {
                        start: line_start,
                        end: brk,
                        width: width_of(line_start, brk),
                    });
                    line_start = if chars.get(brk) == Some(&' ') { brk + 1 } else { brk };
                    last_space = None;
                    j = line_start;
                    continue;
                }
                j += 1;
            }
            lines.push(LineBox {
                start: line_start,
                end: para_end,
                width: width_of(line_start, para_end),
            });

            if para_end >= chars.len() {
                break;
            }
            para_start = para_end + 1;
        }
        lines
    }

    /// Width and height of inline markup laid out within `max_width`.
    fn measure(&self, content: &str, style: &Style, max_width: Option<f32>) -> (f32, f32) {
        let text = plain_text(content);
        if text.is_empty() {
            return (0.0, 0.0);
        }
        let lines = self.wrap(&text, style, max_width);
        let width = lines.iter().map(|l| l.width).fold(0.0, f32::max);
        (width, lines.len() as f32 * self.line_height(style))
    }

    /// Character index of the plain text nearest a point relative to the
    /// top-left of the text area.
    fn caret_offset(&self, content: &str, style: &Style, max_width: f32, x: f32, y: f32) -> usize {
        let text = plain_text(content);
        let chars: Vec<char> = text.chars().collect();
        let lines = self.wrap(&text, style, Some(max_width));
        let lh = self.line_height(style).max(1.0);
        let row = ((y / lh).floor().max(0.0) as usize).min(lines.len().saturating_sub(1));
        let Some(line) = lines.get(row) else {
            return 0;
        };

        let mut best = line.start;
        let mut best_dist = f32::MAX;
        for k in line.start..=line.end {
            let w = self.text_width(&chars[line.start..k].iter().collect::<String>(), style);
            let dist = (w - x).abs();
            if dist < best_dist {
                best = k;
                best_dist = dist;
            }
        }
        best
    }
}

/// Fixed-advance metrics: every glyph is `char_width × font-size` wide.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMetrics {
    pub char_width: f32,
    pub line_height: f32,
    /// Extra advance for bold text.
    pub bold_factor: f32,
}

impl Default for ApproxMetrics {
    fn default() -> Self {
        Self {
            char_width: 0.55,
            line_height: 1.4,
            bold_factor: 1.05,
        }
    }
}

impl TextMetrics for ApproxMetrics {
    fn line_height(&self, style: &Style) -> f32 {
        let size = style.font_size_or_default();
        match style.line_height.as_deref().map(str::trim) {
            None | Some("normal") => size * self.line_height,
            Some(lh) => {
                if let Some(px) = lh.strip_suffix("px").and_then(|v| v.trim().parse::<f32>().ok()) {
                    px
                } else if let Ok(factor) = lh.parse::<f32>() {
                    size * factor
                } else {
                    size * self.line_height
                }
            }
        }
    }

    fn text_width(&self, text: &str, style: &Style) -> f32 {
        let mut w = text.chars().count() as f32 * style.font_size_or_default() * self.char_width;
        if style.is_bold() {
            w *= self.bold_factor;
        }
        w
    }
}

/// Visible text of inline markup: tags dropped, `<br>` as newline,
/// entities decoded, whitespace collapsed.
pub fn plain_text(content: &str) -> String {
    let mut raw = String::with_capacity(content.len());
    let mut rest = content;
    let push_source = |raw: &mut String, s: &str| {
        raw.extend(s.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
    };
    while let Some(lt) = rest.find('<') {
        push_source(&mut raw, &rest[..lt]);
        let after = &rest[lt..];
        let Some(gt) = after.find('>') else {
            push_source(&mut raw, after);
            rest = "";
            break;
        };
        let tag = after[1..gt].trim().to_ascii_lowercase();
        if tag == "br" || tag == "br/" || tag.starts_with("br ") {
            raw.push('\n');
        }
        rest = &after[gt + 1..];
    }
    push_source(&mut raw, rest);

    let decoded = decode_entities(&raw);
    let mut out = String::with_capacity(decoded.len());
    let mut prev_space = true;
    for c in decoded.chars() {
        if c == '\n' {
            while out.ends_with(' ') {
                out.pop();
            }
            out.push('\n');
            prev_space = true;
        } else if c.is_whitespace() && c != '\u{a0}' {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn style(size: f32) -> Style {
        Style {
            font_size: Some(size),
            ..Style::default()
        }
    }

    #[test]
    fn plain_text_strips_markup() {
        assert_eq!(
            plain_text("  Hello <b>big</b>\n   world<br>next &amp; last "),
            "Hello big world\nnext & last"
        );
    }

    #[test]
    fn wrap_breaks_at_spaces() {
        // 10px glyphs (20 × 0.5)
        let m = ApproxMetrics {
            char_width: 0.5,
            ..ApproxMetrics::default()
        };
        let lines = m.wrap("aaaa bbbb cccc", &style(20.0), Some(95.0));
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].start, lines[0].end), (0, 9));
        assert_eq!((lines[1].start, lines[1].end), (10, 14));
    }

    #[test]
    fn wrap_splits_long_words() {
        let m = ApproxMetrics {
            char_width: 0.5,
            ..ApproxMetrics::default()
        };
        let lines = m.wrap("abcdefghij", &style(20.0), Some(45.0));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].end, 4);
    }

    #[test]
    fn measure_counts_lines() {
        let m = ApproxMetrics::default();
        let (_, h) = m.measure("one<br>two", &style(20.0), None);
        assert!((h - 56.0).abs() < 0.01, "two 28px lines, got {h}");
    }

    #[test]
    fn line_height_forms() {
        let m = ApproxMetrics::default();
        let mut s = style(20.0);
        s.line_height = Some("30px".into());
        assert_eq!(m.line_height(&s), 30.0);
        s.line_height = Some("1.5".into());
        assert_eq!(m.line_height(&s), 30.0);
    }

    #[test]
    fn caret_lands_between_characters() {
        let m = ApproxMetrics {
            char_width: 0.5,
            ..ApproxMetrics::default()
        };
        // 10px glyphs; x = 34 is nearest the boundary after 3 chars.
        assert_eq!(m.caret_offset("abcdef", &style(20.0), 500.0, 34.0, 5.0), 3);
        // Second line starts at char 5.
        assert_eq!(m.caret_offset("abcd efgh", &style(20.0), 45.0, 0.0, 30.0), 5);
    }
}
