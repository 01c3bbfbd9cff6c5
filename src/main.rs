mod highlight;
mod matcher;
mod parse;
mod render;
mod search;

use std::{fs, io, path::Path, process};

use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
    DefaultTerminal, Frame,
};
use serde_json::json;

use parse::ContentModel;
use render::{RenderedDocument, SectionPosition};
use search::{PageSearch, ResultsPanel, ScrollAlign, ScrollRequest};

/// State for the table-of-contents overlay.
struct TocState {
    /// Index into `section_lines` of the currently selected section.
    selected: usize,
    /// Scroll offset saved when the TOC was opened (for Esc restore).
    saved_scroll: usize,
}

/// UI side of the search panel. The engine owns visibility and highlights;
/// the panel owns what is being typed and which result row is selected.
#[derive(Default)]
struct SearchPanel {
    input: String,
    selected: usize,
}

/// Explicit subcommands.
#[derive(Subcommand)]
enum Commands {
    /// View a page in TUI mode (equivalent to legacy positional form)
    View {
        /// Path to the markdown file
        file: String,
        /// Heading level that starts a section
        #[arg(long, default_value_t = parse::DEFAULT_SECTION_LEVEL, value_parser = clap::value_parser!(u8).range(1..=6))]
        section_level: u8,
    },
    /// Search a page and print matching sections
    Search {
        /// Path to the markdown file
        file: String,
        /// Text to look for (case-insensitive, literal)
        query: String,
        /// Heading level that starts a section
        #[arg(long, default_value_t = parse::DEFAULT_SECTION_LEVEL, value_parser = clap::value_parser!(u8).range(1..=6))]
        section_level: u8,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the table of contents
    Toc {
        /// Path to the markdown file
        file: String,
        /// Heading level that starts a section
        #[arg(long, default_value_t = parse::DEFAULT_SECTION_LEVEL, value_parser = clap::value_parser!(u8).range(1..=6))]
        section_level: u8,
    },
}

/// Full CLI with explicit subcommands.
#[derive(Parser)]
#[command(
    name = "lexpage",
    version,
    about = "A TUI viewer with in-page search for legal and marketing pages",
    after_help = "INVOCATION FORMS:\n  lexpage <file>                          View page in TUI mode (legacy)\n  lexpage view <file>                     View page in TUI mode\n  lexpage search [OPTIONS] <file> <query> Print matching sections\n  lexpage toc <file>                      Print the table of contents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Legacy positional form: lexpage <file>
#[derive(Parser)]
#[command(
    name = "lexpage",
    version,
    about = "A TUI viewer with in-page search for legal and marketing pages"
)]
struct LegacyCli {
    /// Path to a markdown file to view
    file: String,
}

/// Resolved dispatch mode after CLI argument parsing.
enum DispatchMode {
    Legacy {
        file: String,
    },
    View {
        file: String,
        section_level: u8,
    },
    Search {
        file: String,
        query: String,
        section_level: u8,
        json: bool,
    },
    Toc {
        file: String,
        section_level: u8,
    },
}

/// State for the help/shortcuts modal overlay.
struct HelpState {
    /// Current filter string for narrowing displayed shortcuts.
    filter: String,
    /// Scroll offset within the help modal content.
    scroll_offset: usize,
}

/// A single keyboard shortcut entry.
struct ShortcutEntry {
    key: &'static str,
    description: &'static str,
}

/// A group of related shortcuts.
struct ShortcutCategory {
    name: &'static str,
    entries: Vec<ShortcutEntry>,
}

/// Build the complete list of shortcut categories.
fn shortcut_categories() -> Vec<ShortcutCategory> {
    vec![
        ShortcutCategory {
            name: "Navigation",
            entries: vec![
                ShortcutEntry {
                    key: "j / \u{2193}",
                    description: "Scroll down one line",
                },
                ShortcutEntry {
                    key: "k / \u{2191}",
                    description: "Scroll up one line",
                },
                ShortcutEntry {
                    key: "Ctrl-d / PgDn",
                    description: "Scroll down half page",
                },
                ShortcutEntry {
                    key: "Ctrl-u / PgUp",
                    description: "Scroll up half page",
                },
                ShortcutEntry {
                    key: "g / Home",
                    description: "Jump to top",
                },
                ShortcutEntry {
                    key: "G / End",
                    description: "Jump to bottom",
                },
            ],
        },
        ShortcutCategory {
            name: "Sections",
            entries: vec![
                ShortcutEntry {
                    key: "n",
                    description: "Next section",
                },
                ShortcutEntry {
                    key: "p",
                    description: "Previous section",
                },
                ShortcutEntry {
                    key: "o",
                    description: "Open table of contents",
                },
            ],
        },
        ShortcutCategory {
            name: "Search",
            entries: vec![
                ShortcutEntry {
                    key: "Ctrl-f",
                    description: "Toggle search panel",
                },
                ShortcutEntry {
                    key: "/",
                    description: "Open search panel",
                },
                ShortcutEntry {
                    key: "\u{2191} / \u{2193}",
                    description: "Select result",
                },
                ShortcutEntry {
                    key: "Enter",
                    description: "Jump to selected result",
                },
                ShortcutEntry {
                    key: "Esc",
                    description: "Close panel and clear highlights",
                },
            ],
        },
        ShortcutCategory {
            name: "General",
            entries: vec![
                ShortcutEntry {
                    key: "?",
                    description: "Toggle this help",
                },
                ShortcutEntry {
                    key: "q",
                    description: "Quit",
                },
                ShortcutEntry {
                    key: "Esc",
                    description: "Clear highlights",
                },
            ],
        },
    ]
}

fn resolve_dispatch_mode() -> DispatchMode {
    match Cli::try_parse() {
        Ok(cli) => match cli.command {
            Commands::View {
                file,
                section_level,
            } => DispatchMode::View {
                file,
                section_level,
            },
            Commands::Search {
                file,
                query,
                section_level,
                json,
            } => DispatchMode::Search {
                file,
                query,
                section_level,
                json,
            },
            Commands::Toc {
                file,
                section_level,
            } => DispatchMode::Toc {
                file,
                section_level,
            },
        },
        Err(clap_err) => {
            // Pass --help, --version, and subcommand-level help through to the full Cli handler.
            use clap::error::ErrorKind;
            if matches!(
                clap_err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) {
                clap_err.exit();
            }
            // Fall back to legacy positional parse: lexpage <file>
            match LegacyCli::try_parse() {
                Ok(legacy) => DispatchMode::Legacy { file: legacy.file },
                Err(legacy_err) => legacy_err.exit(),
            }
        }
    }
}

fn main() -> io::Result<()> {
    match resolve_dispatch_mode() {
        DispatchMode::Legacy { file } => {
            eprintln!("[legacy] TUI viewer dispatched for: {file}");
            run_tui_file(&file, parse::DEFAULT_SECTION_LEVEL)
        }
        DispatchMode::View {
            file,
            section_level,
        } => {
            eprintln!("[view] TUI viewer dispatched for: {file}");
            run_tui_file(&file, section_level)
        }
        DispatchMode::Search {
            file,
            query,
            section_level,
            json,
        } => run_search(&file, &query, section_level, json),
        DispatchMode::Toc {
            file,
            section_level,
        } => run_toc(&file, section_level),
    }
}

/// Read and parse a markdown page, exiting with a message on failure.
fn load_page(file_arg: &str, section_level: u8) -> ContentModel {
    let path = Path::new(file_arg);

    // Check the file extension before attempting to read.
    match path.extension().and_then(|e| e.to_str()) {
        Some("md" | "markdown" | "mdx" | "mdown" | "mkd" | "mkdn") => {}
        Some(ext) => {
            eprintln!("Error: '{ext}' is not a recognized markdown extension.");
            eprintln!("Expected a markdown file (.md, .markdown, .mdx, .mdown, .mkd, .mkdn).");
            process::exit(1);
        }
        None => {
            eprintln!("Error: '{file_arg}' has no file extension.");
            eprintln!("Expected a markdown file (.md, .markdown, .mdx, .mdown, .mkd, .mkdn).");
            process::exit(1);
        }
    }

    let source = fs::read_to_string(path).unwrap_or_else(|e| {
        match e.kind() {
            io::ErrorKind::NotFound => {
                eprintln!("Error: file not found: {file_arg}");
            }
            io::ErrorKind::PermissionDenied => {
                eprintln!("Error: permission denied: {file_arg}");
            }
            _ => {
                eprintln!("Error reading '{file_arg}': {e}");
            }
        }
        process::exit(1);
    });

    let model = parse::parse(&source, section_level);
    eprintln!(
        "[parse] file={} sections={} section_level={}",
        file_arg,
        model.sections.len(),
        section_level
    );
    model
}

/// Collapse whitespace runs (including newlines) to single spaces.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn run_search(file_arg: &str, query: &str, section_level: u8, as_json: bool) -> io::Result<()> {
    let model = load_page(file_arg, section_level);
    let mut search = PageSearch::new(&model);
    let results = search.set_query(query).to_vec();
    eprintln!(
        "[search] file={} query={:?} matches={} highlights={}",
        file_arg,
        query,
        results.len(),
        search.highlight_count()
    );

    if as_json {
        let spans = search.highlights();
        let items: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                let highlights: Vec<serde_json::Value> = spans
                    .iter()
                    .filter(|s| s.section == r.section)
                    .map(|s| json!({ "node": s.node, "start": s.range.start, "end": s.range.end }))
                    .collect();
                json!({
                    "section": r.section,
                    "anchor": r.anchor,
                    "heading": r.heading,
                    "snippet": r.snippet,
                    "highlights": highlights,
                })
            })
            .collect();
        let out = serde_json::to_string_pretty(&items)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        println!("{out}");
        return Ok(());
    }

    match search.results() {
        ResultsPanel::Empty => {}
        ResultsPanel::NoResults => println!("No results found"),
        ResultsPanel::Results(results) => {
            for r in results {
                println!("{} (#{})", r.heading, r.anchor);
                println!("    {}", collapse_whitespace(&r.snippet));
            }
        }
    }
    Ok(())
}

fn run_toc(file_arg: &str, section_level: u8) -> io::Result<()> {
    let model = load_page(file_arg, section_level);
    if let Some(title) = &model.title {
        println!("{title}");
    }
    let width = model
        .sections
        .iter()
        .map(|s| s.id.chars().count())
        .max()
        .unwrap_or(0);
    for section in &model.sections {
        println!(
            "  {:width$}  {}  (line {})",
            section.id,
            section.heading,
            section.line,
            width = width
        );
    }
    Ok(())
}

fn run_tui_file(file_arg: &str, section_level: u8) -> io::Result<()> {
    let model = load_page(file_arg, section_level);
    ratatui::run(|terminal| run(terminal, &model))
}

/// Resolve a scroll request against the rendered page.
fn apply_scroll_request(
    request: &ScrollRequest,
    section_lines: &[SectionPosition],
    max_scroll: usize,
) -> Option<usize> {
    match request.align {
        ScrollAlign::Top => section_scroll_target(section_lines, request.section, max_scroll),
    }
}

/// Rendered line to scroll to for a section, clamped to the scroll range.
fn section_scroll_target(
    section_lines: &[SectionPosition],
    section: usize,
    max_scroll: usize,
) -> Option<usize> {
    section_lines
        .get(section)
        .map(|pos| pos.rendered_line.min(max_scroll))
}

fn run(terminal: &mut DefaultTerminal, model: &ContentModel) -> io::Result<()> {
    let mut search = PageSearch::new(model);
    let mut panel = SearchPanel::default();
    let mut width = terminal.size()?.width;
    let mut rendered = render::render_document(model, &search, width);
    let mut scroll_offset: usize = 0;
    let mut toc: Option<TocState> = None;
    let mut help: Option<HelpState> = None;
    // Anchor of the last result jumped to, shown until the next keystroke.
    let mut jumped_to: Option<String> = None;

    loop {
        terminal.draw(|frame| {
            ui(
                frame,
                model,
                &rendered,
                scroll_offset,
                toc.as_ref().map(|t| t.selected),
                &search,
                &panel,
                help.as_ref(),
                jumped_to.as_deref(),
            );
        })?;

        let event = event::read()?;

        // Re-wrap on width change, then clamp the scroll offset on every
        // event so the view stays valid after a resize.
        let size = terminal.size()?;
        if size.width != width {
            width = size.width;
            rendered = render::render_document(model, &search, width);
        }
        let viewport_height = size.height.saturating_sub(1) as usize;
        let max_scroll = rendered.text.lines.len().saturating_sub(viewport_height);
        scroll_offset = scroll_offset.min(max_scroll);

        let Event::Key(key) = event else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        jumped_to = None;

        // Highlights changed; re-render before the next draw.
        let mut dirty = false;

        if key.code == KeyCode::Char('f') && key.modifiers.contains(KeyModifiers::CONTROL) {
            // Global toggle, regardless of which overlay is open.
            toc = None;
            help = None;
            if search.toggle() {
                panel = SearchPanel::default();
            }
            dirty = true;
        } else if let Some(ref mut hl) = help {
            // Help modal is open, handle help-specific keys
            match key.code {
                KeyCode::Esc | KeyCode::Char('?') => {
                    help = None;
                }
                KeyCode::Backspace => {
                    hl.filter.pop();
                    hl.scroll_offset = 0;
                }
                KeyCode::Down => {
                    hl.scroll_offset = hl.scroll_offset.saturating_add(1);
                }
                KeyCode::Up => {
                    hl.scroll_offset = hl.scroll_offset.saturating_sub(1);
                }
                KeyCode::Char(c) => {
                    hl.filter.push(c);
                    hl.scroll_offset = 0;
                }
                _ => {}
            }
        } else if let Some(ref mut tc) = toc {
            // TOC modal is open: move the selection and preview its position
            let num_sections = rendered.section_lines.len();
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    tc.selected = (tc.selected + 1).min(num_sections.saturating_sub(1));
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    tc.selected = tc.selected.saturating_sub(1);
                }
                KeyCode::Char('g') | KeyCode::Home => {
                    tc.selected = 0;
                }
                KeyCode::Char('G') | KeyCode::End => {
                    tc.selected = num_sections.saturating_sub(1);
                }
                KeyCode::Enter => {
                    // Close and stay at selected section
                    toc = None;
                    continue;
                }
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('o') => {
                    // Close and restore original position
                    scroll_offset = tc.saved_scroll;
                    toc = None;
                    continue;
                }
                _ => {}
            }
            if let Some(target) =
                section_scroll_target(&rendered.section_lines, tc.selected, max_scroll)
            {
                scroll_offset = target;
            }
        } else if search.is_open() {
            // Search panel has focus, keystrokes edit the query
            match key.code {
                KeyCode::Esc => {
                    search.close();
                    panel = SearchPanel::default();
                    dirty = true;
                }
                KeyCode::Enter => {
                    let chosen = search
                        .results()
                        .matches()
                        .get(panel.selected)
                        .map(|r| r.section);
                    if let Some(request) = chosen.and_then(|section| search.select_result(section))
                    {
                        if let Some(target) =
                            apply_scroll_request(&request, &rendered.section_lines, max_scroll)
                        {
                            scroll_offset = target;
                        }
                        jumped_to = Some(request.anchor);
                    }
                }
                KeyCode::Down => {
                    let count = search.results().matches().len();
                    panel.selected = (panel.selected + 1).min(count.saturating_sub(1));
                }
                KeyCode::Up => {
                    panel.selected = panel.selected.saturating_sub(1);
                }
                KeyCode::Backspace => {
                    panel.input.pop();
                    search.set_query(&panel.input);
                    panel.selected = 0;
                    dirty = true;
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    panel.input.push(c);
                    search.set_query(&panel.input);
                    panel.selected = 0;
                    dirty = true;
                }
                _ => {}
            }
        } else {
            // Normal mode, handle regular keys
            match key.code {
                KeyCode::Char('q') => return Ok(()),

                // Open table of contents
                KeyCode::Char('o') => {
                    if !rendered.section_lines.is_empty() {
                        let current_idx = rendered
                            .section_lines
                            .iter()
                            .rposition(|s| s.rendered_line <= scroll_offset)
                            .unwrap_or(0);
                        toc = Some(TocState {
                            selected: current_idx,
                            saved_scroll: scroll_offset,
                        });
                    }
                }

                // Single line down
                KeyCode::Char('j') | KeyCode::Down => {
                    scroll_offset = (scroll_offset + 1).min(max_scroll);
                }

                // Single line up
                KeyCode::Char('k') | KeyCode::Up => {
                    scroll_offset = scroll_offset.saturating_sub(1);
                }

                // Half page down
                KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    scroll_offset = (scroll_offset + viewport_height / 2).min(max_scroll);
                }
                KeyCode::PageDown => {
                    scroll_offset = (scroll_offset + viewport_height / 2).min(max_scroll);
                }

                // Half page up
                KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    scroll_offset = scroll_offset.saturating_sub(viewport_height / 2);
                }
                KeyCode::PageUp => {
                    scroll_offset = scroll_offset.saturating_sub(viewport_height / 2);
                }

                // Jump to top
                KeyCode::Char('g') | KeyCode::Home => {
                    scroll_offset = 0;
                }

                // Jump to bottom
                KeyCode::Char('G') | KeyCode::End => {
                    scroll_offset = max_scroll;
                }

                // Next section
                KeyCode::Char('n') => {
                    if let Some(pos) = rendered
                        .section_lines
                        .iter()
                        .find(|s| s.rendered_line > scroll_offset)
                    {
                        scroll_offset = pos.rendered_line.min(max_scroll);
                    }
                }

                // Previous section
                KeyCode::Char('p') => {
                    if let Some(pos) = rendered
                        .section_lines
                        .iter()
                        .rev()
                        .find(|s| s.rendered_line < scroll_offset)
                    {
                        scroll_offset = pos.rendered_line.min(max_scroll);
                    }
                }

                // Open help modal
                KeyCode::Char('?') => {
                    help = Some(HelpState {
                        filter: String::new(),
                        scroll_offset: 0,
                    });
                }

                // Open search panel
                KeyCode::Char('/') => {
                    search.toggle();
                    panel = SearchPanel::default();
                    dirty = true;
                }

                // Escape clears highlights left behind by a selected result
                KeyCode::Esc => {
                    if search.highlight_count() > 0 {
                        search.clear();
                        dirty = true;
                    }
                }

                _ => {}
            }
        }

        if dirty {
            rendered = render::render_document(model, &search, width);
        }
    }
}

/// Find the section containing the current scroll position.
fn current_section_context(
    section_lines: &[SectionPosition],
    scroll_offset: usize,
) -> Option<&SectionPosition> {
    section_lines
        .iter()
        .rev()
        .find(|s| s.rendered_line <= scroll_offset)
}

fn ui(
    frame: &mut Frame,
    model: &ContentModel,
    rendered: &RenderedDocument,
    scroll_offset: usize,
    toc_selected: Option<usize>,
    search: &PageSearch,
    panel: &SearchPanel,
    help: Option<&HelpState>,
    jumped_to: Option<&str>,
) {
    let area = frame.area();

    // Minimum usable terminal size: need width for content and height for viewport + status bar
    const MIN_WIDTH: u16 = 20;
    const MIN_HEIGHT: u16 = 5;
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = "Terminal too small";
        let msg_len = msg.len() as u16;
        let x = area.x + area.width.saturating_sub(msg_len) / 2;
        let y = area.y + area.height / 2;
        let w = msg_len.min(area.width);
        if w > 0 && area.height > 0 {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    msg,
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Rect::new(x, y, w, 1),
            );
        }
        return;
    }

    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);

    let viewport_height = chunks[0].height as usize;
    let total_lines = rendered.text.lines.len();

    // Render scrolled content
    let widget = Paragraph::new(rendered.text.clone()).scroll((scroll_offset as u16, 0));
    frame.render_widget(widget, chunks[0]);

    if let Some(selected) = toc_selected {
        render_toc(frame, model, &rendered.section_lines, selected, chunks[0]);
    }

    if search.is_open() {
        render_search_panel(frame, search, panel, chunks[0]);
    }

    if let Some(hl) = help {
        render_help(frame, hl, chunks[0]);
    }

    // Render status bar with scroll position indicator
    let position = if total_lines == 0 {
        "Empty".to_owned()
    } else if total_lines <= viewport_height {
        "All".to_owned()
    } else if scroll_offset == 0 {
        "Top".to_owned()
    } else if scroll_offset >= total_lines.saturating_sub(viewport_height) {
        "Bot".to_owned()
    } else {
        let pct = (scroll_offset * 100) / total_lines;
        format!("{pct}%")
    };

    let section_ctx = current_section_context(&rendered.section_lines, scroll_offset)
        .map(|s| format!(" \u{00A7} {}", s.heading))
        .unwrap_or_default();

    let search_info = if search.query().is_empty() {
        String::new()
    } else {
        let count = search.results().matches().len();
        let noun = if count == 1 { "section" } else { "sections" };
        format!(
            "  /{} [{count} {noun}, {} marks]",
            search.query(),
            search.highlight_count()
        )
    };

    let jump_info = jumped_to
        .map(|anchor| format!(" -> #{anchor}"))
        .unwrap_or_default();

    let status = format!(
        " Line {}/{} \u{2014} {}{}{}{}",
        scroll_offset + 1,
        total_lines,
        position,
        section_ctx,
        jump_info,
        search_info,
    );
    let status_bar = Paragraph::new(Span::styled(
        status,
        Style::default().fg(Color::Black).bg(Color::White),
    ))
    .style(Style::default().bg(Color::White));
    frame.render_widget(status_bar, chunks[1]);
}

/// Compute a centered rectangle within `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = (area.width * percent_x / 100).max(30).min(area.width);
    let height = (area.height * percent_y / 100).max(5).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Compute a rectangle pinned to the top-right corner of `area`.
fn top_right_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = (area.width * percent_x / 100).max(30).min(area.width);
    let height = (area.height * percent_y / 100).max(6).min(area.height);
    let x = area.x + area.width.saturating_sub(width);
    Rect::new(x, area.y, width, height)
}

/// Cut `text` to at most `max` chars, marking the cut with an ellipsis.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

/// Render the table-of-contents overlay.
fn render_toc(
    frame: &mut Frame,
    model: &ContentModel,
    section_lines: &[SectionPosition],
    selected: usize,
    viewport_area: Rect,
) {
    let popup = centered_rect(60, 70, viewport_area);

    // Clear the popup area
    frame.render_widget(Clear, popup);

    let lines: Vec<Line<'static>> = section_lines
        .iter()
        .map(|s| {
            let style = render::heading_style(s.level);
            Line::from(vec![
                Span::styled(s.heading.clone(), style),
                Span::styled(
                    format!("  #{}", s.anchor),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    // Calculate scroll offset to keep selected item visible (roughly centered)
    let inner_height = popup.height.saturating_sub(2) as usize;
    let scroll = if section_lines.is_empty() || inner_height == 0 {
        0
    } else {
        let max_scroll = section_lines.len().saturating_sub(inner_height);
        selected.saturating_sub(inner_height / 2).min(max_scroll)
    };

    let title = match &model.title {
        Some(t) => format!(" Contents \u{2014} {t} "),
        None => " Contents ".to_owned(),
    };
    let block = Block::bordered()
        .title(title)
        .style(Style::default().fg(Color::White));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((scroll as u16, 0));

    frame.render_widget(paragraph, popup);

    // Apply full-width highlight to the selected line
    if !section_lines.is_empty() && inner_height > 0 {
        let rel_line = selected as isize - scroll as isize;
        if rel_line >= 0 && (rel_line as usize) < inner_height {
            let row = popup.y + 1 + rel_line as u16; // +1 for top border
            let highlight = Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD);
            for col in (popup.x + 1)..(popup.x + popup.width.saturating_sub(1)) {
                let pos = Position::new(col, row);
                if let Some(cell) = frame.buffer_mut().cell_mut(pos) {
                    cell.set_style(highlight);
                }
            }
        }
    }
}

/// Render the floating search panel: input line, then results or a
/// "no results" message.
fn render_search_panel(frame: &mut Frame, search: &PageSearch, panel: &SearchPanel, area: Rect) {
    let popup = top_right_rect(45, 60, area);
    frame.render_widget(Clear, popup);

    let inner_width = popup.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line<'static>> = vec![
        Line::from(vec![
            Span::styled(" Search this page: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{}\u{2502}", panel.input),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(""),
    ];

    // Line index (within `lines`) of the selected result's heading.
    let mut selected_line = 0;
    match search.results() {
        ResultsPanel::Empty => {
            lines.push(Line::from(Span::styled(
                " Type at least 2 characters",
                Style::default().fg(Color::DarkGray),
            )));
        }
        ResultsPanel::NoResults => {
            lines.push(Line::from(Span::styled(
                " No results found",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        ResultsPanel::Results(results) => {
            for (idx, r) in results.iter().enumerate() {
                let mut heading_style = Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD);
                if idx == panel.selected {
                    heading_style = heading_style.add_modifier(Modifier::REVERSED);
                    selected_line = lines.len();
                }
                lines.push(Line::from(Span::styled(
                    format!(" {}", truncate_chars(&r.heading, inner_width.saturating_sub(1))),
                    heading_style,
                )));
                lines.push(Line::from(Span::styled(
                    format!(
                        "   {}",
                        truncate_chars(
                            &collapse_whitespace(&r.snippet),
                            inner_width.saturating_sub(3)
                        )
                    ),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }

    // Keep the selected result (heading + snippet) inside the panel.
    let inner_height = popup.height.saturating_sub(2) as usize;
    let scroll = (selected_line + 2).saturating_sub(inner_height);

    let block = Block::bordered()
        .title(" Search \u{2014} Esc to close ")
        .style(Style::default().fg(Color::White));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, popup);
}

/// Render the help/shortcuts modal overlay with filterable shortcut list.
fn render_help(frame: &mut Frame, help: &HelpState, viewport_area: Rect) {
    let popup = centered_rect(60, 70, viewport_area);

    // Clear the popup area
    frame.render_widget(Clear, popup);

    let categories = shortcut_categories();
    let filter_lower = help.filter.to_lowercase();

    // Build styled lines: filter input, then grouped shortcuts
    let mut lines: Vec<Line<'static>> = Vec::new();

    // Filter input line
    let filter_display = if help.filter.is_empty() {
        " Type to filter...".to_owned()
    } else {
        format!(" {}\u{2502}", help.filter) // │ as cursor
    };
    lines.push(Line::from(Span::styled(
        filter_display,
        Style::default().fg(Color::Yellow),
    )));
    lines.push(Line::from("")); // blank separator

    let mut any_match = false;
    for cat in &categories {
        let filtered: Vec<&ShortcutEntry> = cat
            .entries
            .iter()
            .filter(|e| {
                if filter_lower.is_empty() {
                    return true;
                }
                e.key.to_lowercase().contains(&filter_lower)
                    || e.description.to_lowercase().contains(&filter_lower)
                    || cat.name.to_lowercase().contains(&filter_lower)
            })
            .collect();

        if filtered.is_empty() {
            continue;
        }
        any_match = true;

        lines.push(Line::from(Span::styled(
            format!(" {}", cat.name),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));

        for entry in &filtered {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("   {:16}", entry.key),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    entry.description.to_owned(),
                    Style::default().fg(Color::White),
                ),
            ]));
        }

        lines.push(Line::from(""));
    }

    if !any_match && !filter_lower.is_empty() {
        lines.push(Line::from(Span::styled(
            " No matching shortcuts",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let title = if help.filter.is_empty() {
        " Help \u{2014} ? to close "
    } else {
        " Help \u{2014} Esc to close "
    };

    let block = Block::bordered()
        .title(title)
        .style(Style::default().fg(Color::White));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((help.scroll_offset as u16, 0));

    frame.render_widget(paragraph, popup);
}
