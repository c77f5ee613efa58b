//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. On macOS
//! `meta` is ⌘; elsewhere `ctrl` plays the same role.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Duplicate,
    Copy,
    Paste,

    // ── Formatting ──
    Bold,
    Italic,
    Underline,

    // ── UI ──
    Deselect,
    /// Leave inline text editing.
    ExitEdit,
}

/// Resolves key events into shortcut actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event outside text editing.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "c" | "C" => Some(ShortcutAction::Copy),
                "v" | "V" => Some(ShortcutAction::Paste),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "b" | "B" => Some(ShortcutAction::Bold),
                "i" | "I" => Some(ShortcutAction::Italic),
                "u" | "U" => Some(ShortcutAction::Underline),
                _ => None,
            };
        }

        // ── Single keys ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }

    /// Resolve a key event while a node is in text editing. Only the exit
    /// keys mean anything; every other key is typing.
    pub fn resolve_editing(key: &str, shift: bool) -> Option<ShortcutAction> {
        match key {
            "Escape" => Some(ShortcutAction::ExitEdit),
            "Enter" if !shift => Some(ShortcutAction::ExitEdit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_undo_redo() {
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        assert_eq!(
            ShortcutMap::resolve("z", false, true, false, true),
            Some(ShortcutAction::Redo)
        );
        assert_eq!(
            ShortcutMap::resolve("y", true, false, false, false),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_clipboard() {
        assert_eq!(
            ShortcutMap::resolve("c", false, false, false, true),
            Some(ShortcutAction::Copy)
        );
        assert_eq!(
            ShortcutMap::resolve("V", true, false, false, false),
            Some(ShortcutAction::Paste)
        );
        assert_eq!(
            ShortcutMap::resolve("d", true, false, false, false),
            Some(ShortcutAction::Duplicate)
        );
    }

    #[test]
    fn resolve_formatting() {
        assert_eq!(
            ShortcutMap::resolve("b", false, false, false, true),
            Some(ShortcutAction::Bold)
        );
        assert_eq!(
            ShortcutMap::resolve("i", true, false, false, false),
            Some(ShortcutAction::Italic)
        );
        assert_eq!(
            ShortcutMap::resolve("u", true, false, false, false),
            Some(ShortcutAction::Underline)
        );
    }

    #[test]
    fn resolve_single_keys() {
        assert_eq!(
            ShortcutMap::resolve("Delete", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Deselect)
        );
    }

    #[test]
    fn plain_letters_do_nothing() {
        assert_eq!(ShortcutMap::resolve("c", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("b", false, true, false, false), None);
    }

    #[test]
    fn editing_only_knows_exit_keys() {
        assert_eq!(
            ShortcutMap::resolve_editing("Escape", false),
            Some(ShortcutAction::ExitEdit)
        );
        assert_eq!(
            ShortcutMap::resolve_editing("Enter", false),
            Some(ShortcutAction::ExitEdit)
        );
        assert_eq!(ShortcutMap::resolve_editing("Enter", true), None);
        assert_eq!(ShortcutMap::resolve_editing("Backspace", false), None);
        assert_eq!(ShortcutMap::resolve_editing("z", false), None);
    }
}
