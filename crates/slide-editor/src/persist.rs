//! Persistence adapter: clean markup out to the host.

use slide_core::{SlideTree, clean_for_save, emit_markup};

/// Receives the cleaned slide markup on save.
pub trait SaveSink {
    fn save(&mut self, markup: &str);
}

impl<F: FnMut(&str)> SaveSink for F {
    fn save(&mut self, markup: &str) {
        self(markup)
    }
}

/// Markup for `tree` with every editor artifact removed. The live tree is
/// left untouched.
pub fn cleaned_markup(tree: &SlideTree) -> String {
    let mut copy = tree.clone();
    clean_for_save(&mut copy);
    emit_markup(&copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide_core::parse_slide;

    #[test]
    fn closures_are_sinks() {
        let tree = parse_slide(
            r#"<div class="drag-handle"></div><p id="ps_keep" contenteditable="true">x</p>"#,
        )
        .unwrap();
        let mut saved = Vec::new();
        let mut sink = |m: &str| saved.push(m.to_string());
        sink.save(&cleaned_markup(&tree));

        assert_eq!(saved, vec!["<p id=\"ps_keep\">x</p>\n".to_string()]);
        assert_eq!(tree.len(), 2, "live tree untouched");
    }
}
