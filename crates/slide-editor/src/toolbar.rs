//! Toolbar channel.
//!
//! Commands arrive by name with an optional string value, the way the host
//! toolbar posts them.

use crate::text_edit::FormatCommand;
use serde::Deserialize;
use slide_core::TextAlign;
use slide_core::css::parse_px;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkSpec {
    pub url: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarCommand {
    Format(FormatCommand),
    /// Image source, usually a data URL.
    InsertImage(String),
    InsertTextBox,
    InsertLink(LinkSpec),
    Duplicate,
    Delete,
}

impl ToolbarCommand {
    /// Decode a named command. Unknown names and missing or malformed
    /// values give `None`.
    pub fn parse(name: &str, value: Option<&str>) -> Option<Self> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        let format = |f: FormatCommand| Some(ToolbarCommand::Format(f));
        match name {
            "bold" => format(FormatCommand::Bold),
            "italic" => format(FormatCommand::Italic),
            "underline" => format(FormatCommand::Underline),
            "strikethrough" => format(FormatCommand::Strikethrough),
            "alignLeft" => format(FormatCommand::Align(TextAlign::Left)),
            "alignCenter" => format(FormatCommand::Align(TextAlign::Center)),
            "alignRight" => format(FormatCommand::Align(TextAlign::Right)),
            "fontSize" => {
                let px = parse_px(value?)?;
                (px > 0.0).then_some(ToolbarCommand::Format(FormatCommand::FontSize(px)))
            }
            "fontFamily" => format(FormatCommand::FontFamily(value?.to_string())),
            "textColor" => format(FormatCommand::TextColor(value?.to_string())),
            "backgroundColor" => format(FormatCommand::BackgroundColor(value?.to_string())),
            "insertImage" => Some(ToolbarCommand::InsertImage(value?.to_string())),
            "insertTextBox" => Some(ToolbarCommand::InsertTextBox),
            "insertLink" => {
                let spec: LinkSpec = serde_json::from_str(value?)
                    .map_err(|e| log::warn!("bad insertLink payload: {e}"))
                    .ok()?;
                Some(ToolbarCommand::InsertLink(spec))
            }
            "duplicate" => Some(ToolbarCommand::Duplicate),
            "delete" => Some(ToolbarCommand::Delete),
            _ => None,
        }
    }
}

/// Set while the user works the toolbar so focus moving to it does not end
/// text editing. Releases itself after a while.
#[derive(Debug, Clone, Copy)]
pub struct BusyFlag {
    set_at: Option<f64>,
    release_ms: f64,
}

impl BusyFlag {
    pub fn new(release_ms: f64) -> Self {
        Self {
            set_at: None,
            release_ms,
        }
    }

    pub fn set(&mut self, now: f64) {
        self.set_at = Some(now);
    }

    pub fn release(&mut self) {
        self.set_at = None;
    }

    pub fn is_busy(&self, now: f64) -> bool {
        self.set_at.is_some_and(|t| now - t < self.release_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_formatting() {
        assert_eq!(
            ToolbarCommand::parse("alignCenter", None),
            Some(ToolbarCommand::Format(FormatCommand::Align(TextAlign::Center)))
        );
        assert_eq!(
            ToolbarCommand::parse("fontSize", Some("28px")),
            Some(ToolbarCommand::Format(FormatCommand::FontSize(28.0)))
        );
        assert_eq!(
            ToolbarCommand::parse("fontSize", Some("32")),
            Some(ToolbarCommand::Format(FormatCommand::FontSize(32.0)))
        );
        assert_eq!(ToolbarCommand::parse("fontSize", None), None);
        assert_eq!(ToolbarCommand::parse("textColor", Some("  ")), None);
    }

    #[test]
    fn parses_link_payload() {
        let cmd = ToolbarCommand::parse(
            "insertLink",
            Some(r#"{"url":"https://example.com","text":"docs"}"#),
        );
        assert_eq!(
            cmd,
            Some(ToolbarCommand::InsertLink(LinkSpec {
                url: "https://example.com".into(),
                text: "docs".into(),
            }))
        );
        assert_eq!(ToolbarCommand::parse("insertLink", Some("nope")), None);
    }

    #[test]
    fn unknown_commands_are_none() {
        assert_eq!(ToolbarCommand::parse("rotate", None), None);
    }

    #[test]
    fn busy_flag_auto_releases() {
        let mut busy = BusyFlag::new(1500.0);
        assert!(!busy.is_busy(0.0));
        busy.set(100.0);
        assert!(busy.is_busy(1599.0));
        assert!(!busy.is_busy(1600.0));
        busy.set(2000.0);
        busy.release();
        assert!(!busy.is_busy(2001.0));
    }
}
