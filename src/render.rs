//! Page rendering module.
//!
//! Converts a [`ContentModel`] plus the search engine's highlight state into
//! styled, word-wrapped ratatui [`Text`], and records the rendered line of
//! every section heading so the viewer can scroll to it.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
};

use crate::highlight::{DecoratedText, Fragment};
use crate::parse::{BlockKind, ContentModel};
use crate::search::PageSearch;

/// Narrowest wrap width used regardless of terminal size.
const MIN_WRAP_WIDTH: usize = 10;

/// Where a section heading landed in the rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPosition {
    /// 0-based line index in the rendered output.
    pub rendered_line: usize,
    pub anchor: String,
    pub heading: String,
    pub level: u8,
}

/// Rendered page plus section positions.
pub struct RenderedDocument {
    pub text: Text<'static>,
    pub section_lines: Vec<SectionPosition>,
}

type StyledChar = (char, Style);

pub fn heading_style(level: u8) -> Style {
    let base = Style::default().add_modifier(Modifier::BOLD);
    match level {
        1 => base.fg(Color::Magenta),
        2 => base.fg(Color::Cyan),
        3 => base.fg(Color::Green),
        4 => base.fg(Color::Yellow),
        _ => base.fg(Color::White),
    }
}

/// Style applied on top of the base style for highlighted text.
pub fn mark_style() -> Style {
    Style::default().bg(Color::Yellow).fg(Color::Black)
}

fn heading_prefix(level: u8) -> String {
    format!("{} ", "#".repeat(level.clamp(1, 6) as usize))
}

/// Split a decorated node into lines of styled chars.
fn styled_lines(node: &DecoratedText, base: Style) -> Vec<Vec<StyledChar>> {
    let mut lines = vec![Vec::new()];
    for fragment in node.fragments() {
        let style = match fragment {
            Fragment::Text(_) => base,
            Fragment::Mark(_) => base.patch(mark_style()),
        };
        for c in fragment.as_str().chars() {
            if c == '\n' {
                lines.push(Vec::new());
            } else if let Some(line) = lines.last_mut() {
                line.push((c, style));
            }
        }
    }
    lines
}

/// Greedy word wrap: break at the last space that fits, else hard-break.
/// The space a line breaks on is dropped.
fn wrap(chars: &[StyledChar], width: usize) -> Vec<&[StyledChar]> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut start = 0;
    while chars.len() - start > width {
        let window = &chars[start..=start + width];
        match window.iter().rposition(|(c, _)| *c == ' ').filter(|&p| p > 0) {
            Some(p) => {
                rows.push(&chars[start..start + p]);
                start += p + 1;
            }
            None => {
                rows.push(&chars[start..start + width]);
                start += width;
            }
        }
    }
    rows.push(&chars[start..]);
    rows
}

/// Coalesce runs of equally styled chars into spans.
fn to_spans(row: &[StyledChar]) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut buf = String::new();
    let mut current: Option<Style> = None;
    for &(c, style) in row {
        if current != Some(style) {
            if let Some(prev) = current {
                spans.push(Span::styled(std::mem::take(&mut buf), prev));
            }
            current = Some(style);
        }
        buf.push(c);
    }
    if let Some(style) = current {
        spans.push(Span::styled(buf, style));
    }
    spans
}

/// Accumulates wrapped output lines at a fixed width.
struct PageWriter {
    width: usize,
    lines: Vec<Line<'static>>,
}

impl PageWriter {
    fn blank(&mut self) {
        self.lines.push(Line::default());
    }

    /// Emit one logical line, wrapped, with `first` before the first row and
    /// `rest` (same width) before continuation rows.
    fn emit(&mut self, first: Span<'static>, rest: Span<'static>, chars: &[StyledChar]) {
        let indent = first.content.chars().count();
        let avail = self.width.saturating_sub(indent).max(MIN_WRAP_WIDTH);
        for (i, row) in wrap(chars, avail).into_iter().enumerate() {
            let lead = if i == 0 { first.clone() } else { rest.clone() };
            let mut spans = Vec::with_capacity(row.len() + 1);
            if !lead.content.is_empty() {
                spans.push(lead);
            }
            spans.extend(to_spans(row));
            self.lines.push(Line::from(spans));
        }
    }

    fn block(&mut self, kind: &BlockKind, node: &DecoratedText) {
        match kind {
            BlockKind::Heading(level) => {
                let style = heading_style(*level);
                let prefix = heading_prefix(*level);
                let pad = " ".repeat(prefix.chars().count());
                for line in styled_lines(node, style) {
                    self.emit(
                        Span::styled(prefix.clone(), style),
                        Span::raw(pad.clone()),
                        &line,
                    );
                }
            }
            BlockKind::Paragraph | BlockKind::HtmlBlock => {
                for line in styled_lines(node, Style::default()) {
                    self.emit(Span::raw(""), Span::raw(""), &line);
                }
            }
            BlockKind::CodeBlock => {
                let border_style = Style::default().fg(Color::DarkGray);
                let code_style = Style::default().fg(Color::Green).bg(Color::Black);
                self.lines.push(Line::from(Span::styled("┌───", border_style)));
                for line in styled_lines(node, code_style) {
                    self.emit(
                        Span::styled("│ ", border_style),
                        Span::styled("│ ", border_style),
                        &line,
                    );
                }
                self.lines.push(Line::from(Span::styled("└───", border_style)));
            }
            BlockKind::List => {
                let bullet_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
                for line in styled_lines(node, Style::default()) {
                    if line.iter().all(|(c, _)| c.is_whitespace()) {
                        continue;
                    }
                    self.emit(
                        Span::styled("  • ", bullet_style),
                        Span::raw("    "),
                        &line,
                    );
                }
            }
            BlockKind::BlockQuote => {
                let bar_style = Style::default().fg(Color::DarkGray);
                let text_style = Style::default().add_modifier(Modifier::ITALIC).fg(Color::Gray);
                for line in styled_lines(node, text_style) {
                    self.emit(
                        Span::styled("  ▌ ", bar_style),
                        Span::styled("  ▌ ", bar_style),
                        &line,
                    );
                }
            }
            BlockKind::ThematicBreak => {
                let rule = "─".repeat(self.width.clamp(MIN_WRAP_WIDTH, 40));
                self.lines.push(Line::from(Span::styled(
                    rule,
                    Style::default().fg(Color::DarkGray),
                )));
            }
            BlockKind::Table => {
                let style = Style::default().fg(Color::White);
                for line in styled_lines(node, style) {
                    if line.iter().all(|(c, _)| c.is_whitespace()) {
                        continue;
                    }
                    self.emit(Span::raw("  "), Span::raw("  "), &line);
                }
            }
        }
    }
}

/// Render the page at `width` columns.
///
/// Section headings and bodies are drawn from the engine's decorated nodes,
/// so current highlights show up in place. The caller clips to the viewport.
pub fn render_document(model: &ContentModel, search: &PageSearch, width: u16) -> RenderedDocument {
    let mut page = PageWriter {
        width: usize::from(width),
        lines: Vec::new(),
    };
    let mut section_lines = Vec::new();

    if let Some(title) = &model.title {
        page.block(&BlockKind::Heading(1), &DecoratedText::plain(title));
    }
    if let Some(updated) = &model.updated {
        page.lines.push(Line::from(Span::styled(
            format!("Last updated: {updated}"),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    for block in &model.preamble {
        if !page.lines.is_empty() {
            page.blank();
        }
        page.block(&block.kind, &DecoratedText::plain(&block.content));
    }

    for (idx, section) in search.sections().iter().enumerate() {
        let Some(decorated) = search.decorated(idx) else {
            continue;
        };
        if !page.lines.is_empty() {
            page.blank();
        }
        section_lines.push(SectionPosition {
            rendered_line: page.lines.len(),
            anchor: section.id.clone(),
            heading: section.heading.clone(),
            level: section.level,
        });

        let mut nodes = decorated.nodes.iter();
        if let Some(heading) = nodes.next() {
            page.block(&BlockKind::Heading(section.level), heading);
        }
        for (block, node) in section.blocks.iter().zip(nodes) {
            page.blank();
            page.block(&block.kind, node);
        }
    }

    RenderedDocument {
        text: Text::from(page.lines),
        section_lines,
    }
}
