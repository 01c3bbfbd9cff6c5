//! Highlight decorations over a single text node.
//!
//! A [`DecoratedText`] is a run of [`Fragment`]s whose concatenation is always
//! the node's original text. Highlighting splits plain fragments around
//! matches; clearing turns marks back into plain text and merges neighbours,
//! so the node ends up exactly as it started.

use std::ops::Range;

use crate::matcher::FoldedText;

/// One piece of a decorated text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Mark(String),
}

impl Fragment {
    pub fn as_str(&self) -> &str {
        match self {
            Fragment::Text(s) | Fragment::Mark(s) => s,
        }
    }

    pub fn is_mark(&self) -> bool {
        matches!(self, Fragment::Mark(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedText {
    fragments: Vec<Fragment>,
}

impl DecoratedText {
    /// A node with no decorations.
    pub fn plain(text: &str) -> Self {
        let mut node = Self {
            fragments: vec![Fragment::Text(text.to_owned())],
        };
        node.normalize();
        node
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// The node's text with all decorations ignored.
    pub fn text_content(&self) -> String {
        self.fragments.iter().map(Fragment::as_str).collect()
    }

    pub fn mark_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.is_mark()).count()
    }

    /// Byte ranges of every mark within [`Self::text_content`].
    pub fn mark_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut offset = 0;
        for fragment in &self.fragments {
            let len = fragment.as_str().len();
            if fragment.is_mark() {
                ranges.push(offset..offset + len);
            }
            offset += len;
        }
        ranges
    }

    /// Wrap every occurrence of the folded `needle` found inside plain
    /// fragments in a mark. Existing marks are left alone.
    ///
    /// Returns the number of marks added.
    pub fn highlight(&mut self, needle: &str) -> usize {
        let mut added = 0;
        let mut out = Vec::with_capacity(self.fragments.len());
        for fragment in std::mem::take(&mut self.fragments) {
            let text = match fragment {
                Fragment::Text(text) => text,
                mark => {
                    out.push(mark);
                    continue;
                }
            };
            let folded = FoldedText::new(&text);
            let mut last = 0;
            for range in folded.find_iter(needle) {
                if range.start > last {
                    out.push(Fragment::Text(text[last..range.start].to_owned()));
                }
                out.push(Fragment::Mark(text[range.clone()].to_owned()));
                last = range.end;
                added += 1;
            }
            if last < text.len() {
                out.push(Fragment::Text(text[last..].to_owned()));
            }
        }
        self.fragments = out;
        added
    }

    /// Remove every mark, then normalize.
    ///
    /// Returns the number of marks removed.
    pub fn unhighlight(&mut self) -> usize {
        let mut removed = 0;
        for fragment in &mut self.fragments {
            if let Fragment::Mark(text) = fragment {
                *fragment = Fragment::Text(std::mem::take(text));
                removed += 1;
            }
        }
        self.normalize();
        removed
    }

    /// Merge adjacent plain fragments and drop empty ones.
    fn normalize(&mut self) {
        let mut out: Vec<Fragment> = Vec::with_capacity(self.fragments.len());
        for fragment in std::mem::take(&mut self.fragments) {
            if let Fragment::Text(text) = &fragment {
                if text.is_empty() {
                    continue;
                }
                if let Some(Fragment::Text(prev)) = out.last_mut() {
                    prev.push_str(text);
                    continue;
                }
            }
            out.push(fragment);
        }
        self.fragments = out;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::fold;

    #[test]
    fn plain_node_is_one_fragment() {
        let node = DecoratedText::plain("Hello world");
        assert_eq!(node.fragments(), &[Fragment::Text("Hello world".into())]);
        assert_eq!(node.mark_count(), 0);
    }

    #[test]
    fn empty_node_has_no_fragments() {
        let node = DecoratedText::plain("");
        assert!(node.fragments().is_empty());
        assert_eq!(node.text_content(), "");
    }

    #[test]
    fn highlight_wraps_each_occurrence() {
        let mut node = DecoratedText::plain("Fees: fee waived, FEE due.");
        let added = node.highlight(&fold("fee"));
        assert_eq!(added, 3);
        assert_eq!(
            node.fragments(),
            &[
                Fragment::Mark("Fee".into()),
                Fragment::Text("s: ".into()),
                Fragment::Mark("fee".into()),
                Fragment::Text(" waived, ".into()),
                Fragment::Mark("FEE".into()),
                Fragment::Text(" due.".into()),
            ]
        );
        assert_eq!(node.text_content(), "Fees: fee waived, FEE due.");
    }

    #[test]
    fn highlight_preserves_whitespace() {
        let original = "  line one\n\tline   two  ";
        let mut node = DecoratedText::plain(original);
        node.highlight(&fold("line"));
        assert_eq!(node.text_content(), original);
        assert_eq!(node.mark_ranges(), vec![2..6, 12..16]);
    }

    #[test]
    fn whole_node_match_is_single_mark() {
        let mut node = DecoratedText::plain("Cookies");
        node.highlight(&fold("cookies"));
        assert_eq!(node.fragments(), &[Fragment::Mark("Cookies".into())]);
    }

    #[test]
    fn unhighlight_restores_single_text_fragment() {
        let original = "arbitration and more arbitration";
        let mut node = DecoratedText::plain(original);
        node.highlight(&fold("arbitration"));
        assert_eq!(node.mark_count(), 2);

        let removed = node.unhighlight();
        assert_eq!(removed, 2);
        assert_eq!(node.fragments(), &[Fragment::Text(original.into())]);
    }

    #[test]
    fn highlight_skips_existing_marks() {
        let mut node = DecoratedText::plain("abc abc");
        node.highlight(&fold("abc"));
        let again = node.highlight(&fold("abc"));
        assert_eq!(again, 0);
        assert_eq!(node.mark_count(), 2);
    }
}
