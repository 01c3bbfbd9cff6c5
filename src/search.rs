//! In-page search over a fixed set of sections.
//!
//! [`PageSearch`] owns the highlight state for every section of a
//! [`ContentModel`]. Each [`PageSearch::set_query`] clears all previous
//! highlights before scanning, so the marks present at any time belong to the
//! latest query only, and [`PageSearch::clear`] restores every text node
//! exactly.

use std::ops::Range;

use crate::highlight::DecoratedText;
use crate::matcher::{fold, FoldedText};
use crate::parse::{ContentModel, Section};

/// Queries shorter than this (in chars), or made only of whitespace, never
/// match.
pub const MIN_QUERY_CHARS: usize = 2;

/// Chars of context kept on each side of a snippet's match.
pub const SNIPPET_CONTEXT_CHARS: usize = 50;

/// Marker placed before and after every snippet.
pub const ELLIPSIS: &str = "...";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The per-section outcome of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Index of the section in document order.
    pub section: usize,
    /// Anchor id of the section.
    pub anchor: String,
    pub heading: String,
    pub snippet: String,
}

/// What the results panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultsPanel {
    /// Nothing searched yet, query too short, or cleared.
    #[default]
    Empty,
    /// A query was evaluated and matched nothing.
    NoResults,
    Results(Vec<MatchResult>),
}

impl ResultsPanel {
    pub fn matches(&self) -> &[MatchResult] {
        match self {
            ResultsPanel::Results(results) => results,
            ResultsPanel::Empty | ResultsPanel::NoResults => &[],
        }
    }
}

/// One highlight decoration currently present in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub section: usize,
    /// Text node within the section (0 is the heading).
    pub node: usize,
    /// Byte range within the node's text.
    pub range: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    Top,
}

/// A request for the navigation collaborator to bring a section into view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    pub section: usize,
    pub anchor: String,
    pub align: ScrollAlign,
    #[allow(dead_code)] // terminal scrolling has no animation
    pub smooth: bool,
}

/// Highlight state for one section: one decorated node per text node.
#[derive(Debug, Clone)]
pub struct DecoratedSection {
    pub nodes: Vec<DecoratedText>,
}

impl DecoratedSection {
    fn from_section(section: &Section) -> Self {
        Self {
            nodes: section.text_nodes().map(DecoratedText::plain).collect(),
        }
    }

    /// Node texts joined by newlines, matching [`Section::text_content`].
    pub fn text_content(&self) -> String {
        self.nodes
            .iter()
            .map(DecoratedText::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn mark_count(&self) -> usize {
        self.nodes.iter().map(DecoratedText::mark_count).sum()
    }

    fn highlight(&mut self, needle: &str) -> usize {
        self.nodes.iter_mut().map(|n| n.highlight(needle)).sum()
    }

    fn unhighlight(&mut self) -> usize {
        self.nodes.iter_mut().map(DecoratedText::unhighlight).sum()
    }
}

// ---------------------------------------------------------------------------
// Snippets
// ---------------------------------------------------------------------------

/// Build a result snippet around the first case-insensitive occurrence of
/// `query` in `text`.
///
/// Keeps up to [`SNIPPET_CONTEXT_CHARS`] chars before and after the match,
/// clipped at the text edges, wrapped in [`ELLIPSIS`]. Returns `None` when
/// the query does not occur.
pub fn extract_snippet(text: &str, query: &str) -> Option<String> {
    let needle = fold(query);
    let found = FoldedText::new(text).find(&needle)?;

    let start = text[..found.start]
        .char_indices()
        .rev()
        .take(SNIPPET_CONTEXT_CHARS)
        .last()
        .map_or(found.start, |(idx, _)| idx);
    let end = text[found.end..]
        .char_indices()
        .nth(SNIPPET_CONTEXT_CHARS)
        .map_or(text.len(), |(idx, _)| found.end + idx);

    Some(format!("{ELLIPSIS}{}{ELLIPSIS}", &text[start..end]))
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The in-page search engine and its panel state.
pub struct PageSearch {
    sections: Vec<Section>,
    decorated: Vec<DecoratedSection>,
    query: String,
    results: ResultsPanel,
    open: bool,
}

impl PageSearch {
    pub fn new(model: &ContentModel) -> Self {
        Self {
            decorated: model
                .sections
                .iter()
                .map(DecoratedSection::from_section)
                .collect(),
            sections: model.sections.clone(),
            query: String::new(),
            results: ResultsPanel::Empty,
            open: false,
        }
    }

    /// Evaluate `query` against every section, replacing all previous
    /// highlights and results.
    pub fn set_query(&mut self, query: &str) -> &[MatchResult] {
        self.clear();
        if query.chars().count() < MIN_QUERY_CHARS || query.trim().is_empty() {
            return &[];
        }
        self.query = query.to_owned();

        let needle = fold(query);
        let mut results = Vec::new();
        for (idx, (section, decorated)) in
            self.sections.iter().zip(self.decorated.iter_mut()).enumerate()
        {
            let text = section.text_content();
            let Some(snippet) = extract_snippet(&text, query) else {
                continue;
            };
            decorated.highlight(&needle);
            results.push(MatchResult {
                section: idx,
                anchor: section.id.clone(),
                heading: section.heading.clone(),
                snippet,
            });
        }

        self.results = if results.is_empty() {
            ResultsPanel::NoResults
        } else {
            ResultsPanel::Results(results)
        };
        self.results.matches()
    }

    /// Ask for `section` to be scrolled to the top and hide the panel.
    ///
    /// Highlights are kept. Returns `None` for an unknown section.
    pub fn select_result(&mut self, section: usize) -> Option<ScrollRequest> {
        let anchor = self.sections.get(section)?.id.clone();
        self.open = false;
        Some(ScrollRequest {
            section,
            anchor,
            align: ScrollAlign::Top,
            smooth: true,
        })
    }

    /// Remove every highlight and empty the results panel.
    pub fn clear(&mut self) {
        for decorated in &mut self.decorated {
            decorated.unhighlight();
        }
        self.query.clear();
        self.results = ResultsPanel::Empty;
        debug_assert!(self
            .sections
            .iter()
            .enumerate()
            .all(|(idx, s)| self.text_content(idx) == Some(s.text_content())));
    }

    /// Show the panel if hidden, otherwise hide it and clear highlights.
    ///
    /// Returns whether the panel is now open.
    pub fn toggle(&mut self) -> bool {
        if self.open {
            self.close();
        } else {
            self.open = true;
        }
        self.open
    }

    /// Hide the panel and clear highlights.
    pub fn close(&mut self) {
        self.open = false;
        self.clear();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The last evaluated query (empty after a clear or a short query).
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &ResultsPanel {
        &self.results
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn decorated(&self, section: usize) -> Option<&DecoratedSection> {
        self.decorated.get(section)
    }

    /// Current text of a section as seen through its decorations.
    pub fn text_content(&self, section: usize) -> Option<String> {
        self.decorated(section).map(DecoratedSection::text_content)
    }

    /// Every highlight currently present, in document order.
    pub fn highlights(&self) -> Vec<HighlightSpan> {
        let mut spans = Vec::new();
        for (section, decorated) in self.decorated.iter().enumerate() {
            for (node, text) in decorated.nodes.iter().enumerate() {
                spans.extend(text.mark_ranges().into_iter().map(|range| HighlightSpan {
                    section,
                    node,
                    range,
                }));
            }
        }
        spans
    }

    pub fn highlight_count(&self) -> usize {
        self.decorated.iter().map(DecoratedSection::mark_count).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{self, DEFAULT_SECTION_LEVEL};

    const LEGAL_PAGE: &str = "\
# Legal

## Privacy

We collect the data you give us.

## Terms

Disputes go to binding arbitration. Arbitration is final.

## Cookies

We use cookies for sessions.
";

    fn engine(src: &str) -> PageSearch {
        PageSearch::new(&parse::parse(src, DEFAULT_SECTION_LEVEL))
    }

    fn originals(search: &PageSearch) -> Vec<String> {
        search.sections().iter().map(Section::text_content).collect()
    }

    fn current(search: &PageSearch) -> Vec<String> {
        (0..search.sections().len())
            .filter_map(|i| search.text_content(i))
            .collect()
    }

    #[test]
    fn short_queries_do_nothing() {
        let mut search = engine(LEGAL_PAGE);
        for q in ["", "a", "T", " "] {
            assert!(search.set_query(q).is_empty());
            assert_eq!(search.highlight_count(), 0);
            assert_eq!(search.results(), &ResultsPanel::Empty);
        }
    }

    #[test]
    fn short_query_clears_previous_highlights() {
        let mut search = engine(LEGAL_PAGE);
        search.set_query("we");
        assert!(search.highlight_count() > 0);
        search.set_query("w");
        assert_eq!(search.highlight_count(), 0);
        assert_eq!(search.results(), &ResultsPanel::Empty);
    }

    #[test]
    fn whitespace_only_query_never_matches() {
        let mut search = engine("## Spaced\n\n```\na    b\n```\n");
        assert!(search.set_query("    ").is_empty());
        assert_eq!(search.results(), &ResultsPanel::Empty);
        assert_eq!(search.highlight_count(), 0);
    }

    #[test]
    fn arbitration_scenario() {
        let mut search = engine(LEGAL_PAGE);
        let before = originals(&search);

        let results = search.set_query("arbitration").to_vec();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].heading, "Terms");
        assert_eq!(results[0].anchor, "terms");
        assert_eq!(search.highlight_count(), 2);

        search.toggle();
        assert!(search.is_open());
        let request = search.select_result(results[0].section);
        assert_eq!(
            request,
            Some(ScrollRequest {
                section: 1,
                anchor: "terms".into(),
                align: ScrollAlign::Top,
                smooth: true,
            })
        );
        assert!(!search.is_open());
        // Selecting keeps highlights.
        assert_eq!(search.highlight_count(), 2);

        search.clear();
        assert_eq!(search.highlight_count(), 0);
        assert_eq!(current(&search), before);
    }

    #[test]
    fn every_occurrence_marked_once() {
        let mut search = engine(LEGAL_PAGE);
        search.set_query("WE");
        let spans = search.highlights();
        // "We collect", "We use"
        assert_eq!(spans.len(), 2);
        for span in &spans {
            let section = &search.sections()[span.section];
            let node = section.text_nodes().nth(span.node).unwrap_or_default();
            assert_eq!(node[span.range.clone()].to_lowercase(), "we");
        }
    }

    #[test]
    fn heading_text_is_highlighted_too() {
        let mut search = engine(LEGAL_PAGE);
        search.set_query("cookies");
        let spans = search.highlights();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].node, 0);
        assert_eq!(spans[0].range, 0..7);
    }

    #[test]
    fn second_query_replaces_first() {
        let mut search = engine(LEGAL_PAGE);
        search.set_query("arbitration");
        assert_eq!(search.highlight_count(), 2);

        search.set_query("cookies");
        assert_eq!(search.highlight_count(), 2);
        assert!(search.highlights().iter().all(|s| s.section == 2));
        assert_eq!(search.results().matches().len(), 1);
        assert_eq!(search.query(), "cookies");
    }

    #[test]
    fn clear_round_trips_after_many_queries() {
        let mut search = engine(LEGAL_PAGE);
        let before = originals(&search);
        for q in ["we", "e", "arbitration", "ARB", "s", "us"] {
            search.set_query(q);
        }
        search.clear();
        assert_eq!(current(&search), before);
        assert!(search.highlights().is_empty());
        assert_eq!(search.results(), &ResultsPanel::Empty);
        assert_eq!(search.query(), "");
    }

    #[test]
    fn highlighting_does_not_alter_text() {
        let mut search = engine(LEGAL_PAGE);
        let before = originals(&search);
        search.set_query("e");
        search.set_query("se");
        assert_eq!(current(&search), before);
    }

    #[test]
    fn no_matches_is_explicit() {
        let mut search = engine(LEGAL_PAGE);
        assert!(search.set_query("zebra").is_empty());
        assert_eq!(search.results(), &ResultsPanel::NoResults);
        assert_eq!(search.highlight_count(), 0);
    }

    #[test]
    fn results_follow_document_order() {
        let mut search = engine(LEGAL_PAGE);
        let sections: Vec<usize> = search.set_query("s").iter().map(|r| r.section).collect();
        assert!(sections.is_empty());

        let sections: Vec<usize> = search.set_query("we").iter().map(|r| r.section).collect();
        assert_eq!(sections, vec![0, 2]);
    }

    #[test]
    fn pattern_characters_match_literally() {
        let src = "## One\n\nValue a.b here.\n\n## Two\n\nValue axb here.\n\n## Three\n\nCost (USD)* only.\n";
        let mut search = engine(src);

        let results = search.set_query("a.b").to_vec();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].heading, "One");

        let results = search.set_query("(usd)*").to_vec();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].heading, "Three");

        assert!(search.set_query(".*").is_empty());
        assert!(search.set_query("[a-z]+").is_empty());
        assert!(search.set_query("\\d").is_empty());
    }

    #[test]
    fn toggle_and_close() {
        let mut search = engine(LEGAL_PAGE);
        assert!(search.toggle());
        search.set_query("terms");
        assert!(search.highlight_count() > 0);

        assert!(!search.toggle());
        assert_eq!(search.highlight_count(), 0);
        assert_eq!(search.results(), &ResultsPanel::Empty);

        search.toggle();
        search.set_query("terms");
        search.close();
        assert!(!search.is_open());
        assert_eq!(search.highlight_count(), 0);
    }

    #[test]
    fn select_unknown_section() {
        let mut search = engine(LEGAL_PAGE);
        search.toggle();
        assert_eq!(search.select_result(99), None);
        assert!(search.is_open());
    }

    #[test]
    fn snippet_window_is_clipped_at_edges() {
        let text = "the quick brown fox jumps";
        assert_eq!(
            extract_snippet(text, "brown").as_deref(),
            Some("...the quick brown fox jumps...")
        );
    }

    #[test]
    fn snippet_window_keeps_fifty_chars_each_side() {
        let before = "b".repeat(80);
        let after = "a".repeat(80);
        let text = format!("{before}MATCH{after}");
        let snippet = extract_snippet(&text, "match").unwrap_or_default();
        assert_eq!(snippet, format!("...{}MATCH{}...", "b".repeat(50), "a".repeat(50)));
    }

    #[test]
    fn snippet_counts_chars_not_bytes() {
        let text = format!("{}target{}", "é".repeat(60), "ü".repeat(60));
        let snippet = extract_snippet(&text, "TARGET").unwrap_or_default();
        assert_eq!(
            snippet,
            format!("...{}target{}...", "é".repeat(50), "ü".repeat(50))
        );
    }

    #[test]
    fn snippet_uses_first_occurrence() {
        let text = "alpha beta alpha";
        assert_eq!(
            extract_snippet(text, "ALPHA").as_deref(),
            Some("...alpha beta alpha...")
        );
        assert_eq!(extract_snippet(text, "gamma"), None);
    }
}
