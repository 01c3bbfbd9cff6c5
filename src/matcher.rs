//! Case-insensitive literal substring search.
//!
//! Queries are plain text: `.`, `*`, `(` and friends match themselves and
//! nothing else. Lowercasing can change byte lengths (`İ` folds to two chars),
//! so the folded haystack keeps a map back to offsets in the original text.

use std::ops::Range;

/// Lowercase `text` one char at a time, the same way haystacks are folded.
pub fn fold(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// A lowercased copy of a text that can report matches in original offsets.
pub struct FoldedText {
    folded: String,
    /// `(folded_offset, original_offset)` at the start of every original
    /// char, followed by one entry for the end of both strings.
    boundaries: Vec<(usize, usize)>,
}

impl FoldedText {
    pub fn new(original: &str) -> Self {
        let mut folded = String::with_capacity(original.len());
        let mut boundaries = Vec::with_capacity(original.len() + 1);
        for (offset, c) in original.char_indices() {
            boundaries.push((folded.len(), offset));
            folded.extend(c.to_lowercase());
        }
        boundaries.push((folded.len(), original.len()));
        Self { folded, boundaries }
    }

    /// Iterate over non-overlapping matches of an already folded `needle`,
    /// yielding byte ranges into the original text.
    pub fn find_iter<'n>(&'n self, needle: &'n str) -> Matches<'n> {
        Matches {
            text: self,
            needle,
            pos: 0,
        }
    }

    /// First match of an already folded `needle`, in original offsets.
    pub fn find(&self, needle: &str) -> Option<Range<usize>> {
        self.find_iter(needle).next()
    }

    /// Map a folded offset to the original offset, if it falls on the start
    /// of an original char (or the very end).
    fn original_offset(&self, folded_offset: usize) -> Option<usize> {
        self.boundaries
            .binary_search_by_key(&folded_offset, |&(folded, _)| folded)
            .ok()
            .map(|idx| self.boundaries[idx].1)
    }
}

/// Iterator returned by [`FoldedText::find_iter`].
pub struct Matches<'n> {
    text: &'n FoldedText,
    needle: &'n str,
    pos: usize,
}

impl Iterator for Matches<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.needle.is_empty() {
            return None;
        }
        let folded = self.text.folded.as_str();
        while self.pos < folded.len() {
            let rel = folded[self.pos..].find(self.needle)?;
            let start = self.pos + rel;
            let end = start + self.needle.len();
            match (
                self.text.original_offset(start),
                self.text.original_offset(end),
            ) {
                (Some(orig_start), Some(orig_end)) => {
                    self.pos = end;
                    return Some(orig_start..orig_end);
                }
                _ => {
                    // Hit lands inside the expansion of a single original
                    // char; skip past its first folded char and keep looking.
                    let step = folded[start..].chars().next().map_or(1, char::len_utf8);
                    self.pos = start + step;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(haystack: &str, query: &str) -> Vec<Range<usize>> {
        let folded = fold(query);
        FoldedText::new(haystack).find_iter(&folded).collect()
    }

    #[test]
    fn finds_all_case_insensitive() {
        let text = "Terms apply. TERMS change. terms end.";
        let found = ranges(text, "terms");
        assert_eq!(found.len(), 3);
        for r in &found {
            assert_eq!(text[r.clone()].to_lowercase(), "terms");
        }
    }

    #[test]
    fn matches_do_not_overlap() {
        assert_eq!(ranges("aaaa", "aa"), vec![0..2, 2..4]);
    }

    #[test]
    fn special_characters_are_literal() {
        assert_eq!(ranges("see a.b here", "a.b"), vec![4..7]);
        assert!(ranges("see axb here", "a.b").is_empty());
        assert_eq!(ranges("fee (waived)*", "(waived)*"), vec![4..13]);
        assert!(ranges("anything", ".*").is_empty());
    }

    #[test]
    fn empty_needle_finds_nothing() {
        assert!(ranges("some text", "").is_empty());
    }

    #[test]
    fn offsets_map_back_across_length_changing_folds() {
        // 'İ' lowercases to "i\u{307}" (3 bytes from 2).
        let text = "İstanbul office";
        let found = ranges(text, "office");
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].clone()], "office");

        let found = ranges(text, "i\u{307}stanbul");
        assert_eq!(found, vec![0..text.find(' ').unwrap_or(0)]);
    }

    #[test]
    fn hit_inside_single_char_expansion_is_skipped() {
        // "i" matches the first half of the folded 'İ' but is not a whole char.
        let text = "İ and i";
        let found = ranges(text, "i");
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].clone()], "i");
    }

    #[test]
    fn non_ascii_text_keeps_char_boundaries() {
        let text = "Données personnelles – RÉSUMÉ";
        let found = ranges(text, "résumé");
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].clone()], "RÉSUMÉ");
    }
}
