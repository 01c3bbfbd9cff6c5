//! Markdown parsing module.
//!
//! Parses a markdown page into a [`ContentModel`]:
//! - an optional title and last-updated date (YAML front matter or the
//!   leading top-level heading)
//! - preamble blocks that appear before the first section
//! - an ordered list of [`Section`]s, each starting at a heading of the
//!   configured section level and carrying a unique anchor id

use std::collections::{HashMap, HashSet};

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Heading level that starts a new section unless configured otherwise.
pub const DEFAULT_SECTION_LEVEL: u8 = 2;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of a top-level content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    CodeBlock,
    List,
    BlockQuote,
    ThematicBreak,
    HtmlBlock,
    Table,
}

/// A top-level content block in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub kind: BlockKind,
    /// 1-based starting line number.
    pub line_start: usize,
    /// Flattened text content of the block.
    pub content: String,
}

/// A titled block of page content with a stable anchor id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// URL-safe anchor id, unique within the document.
    pub id: String,
    /// Heading text, with line breaks flattened to spaces.
    pub heading: String,
    /// Heading level (1–6).
    pub level: u8,
    /// 1-based line number of the heading.
    pub line: usize,
    /// Body blocks between this heading and the next section.
    pub blocks: Vec<ContentBlock>,
}

impl Section {
    /// The section's text nodes: the heading followed by each block's content.
    pub fn text_nodes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.heading.as_str()).chain(self.blocks.iter().map(|b| b.content.as_str()))
    }

    /// All text nodes joined by newlines.
    pub fn text_content(&self) -> String {
        self.text_nodes().collect::<Vec<_>>().join("\n")
    }
}

/// The fully parsed page.
#[derive(Debug, Clone, Default)]
pub struct ContentModel {
    /// Front matter `title`, else the first heading above section level.
    pub title: Option<String>,
    /// Front matter `last_updated` (or `effective_date`).
    pub updated: Option<String>,
    /// Blocks before the first section.
    pub preamble: Vec<ContentBlock>,
    pub sections: Vec<Section>,
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Maps byte offsets into a source string to 1-based line numbers.
struct LineIndex {
    /// Byte offsets of each `\n` character in the source.
    newline_offsets: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let newline_offsets = source
            .bytes()
            .enumerate()
            .filter_map(|(i, b)| if b == b'\n' { Some(i) } else { None })
            .collect();
        Self { newline_offsets }
    }

    /// Convert a byte offset to a 1-based line number.
    fn line_at(&self, offset: usize) -> usize {
        match self.newline_offsets.binary_search(&offset) {
            Ok(idx) | Err(idx) => idx + 1,
        }
    }
}

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Returns `true` for block-level tags (as opposed to inline spans).
fn is_block_level(tag: &Tag) -> bool {
    !matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
    )
}

fn is_block_level_end(tag: &TagEnd) -> bool {
    !matches!(
        tag,
        TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image
    )
}

/// Map a *top-level* block tag to its [`BlockKind`].
///
/// Returns `None` for block tags that only appear nested (e.g. `Item`,
/// `TableRow`) and for metadata blocks, which are handled separately.
fn tag_to_block_kind(tag: &Tag) -> Option<BlockKind> {
    match tag {
        Tag::Paragraph => Some(BlockKind::Paragraph),
        Tag::Heading { level, .. } => Some(BlockKind::Heading(heading_level_to_u8(level))),
        Tag::CodeBlock(_) => Some(BlockKind::CodeBlock),
        Tag::BlockQuote(..) => Some(BlockKind::BlockQuote),
        Tag::List(_) => Some(BlockKind::List),
        Tag::Table(_) => Some(BlockKind::Table),
        Tag::HtmlBlock => Some(BlockKind::HtmlBlock),
        _ => None,
    }
}

/// Convert heading text to a URL-safe anchor slug.
///
/// Lowercases the text, maps spaces/hyphens/underscores to `-`, drops every
/// other non-alphanumeric character, collapses hyphen runs and trims them
/// from both ends.
fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if (c == ' ' || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_owned()
}

/// Hands out anchor ids, suffixing repeats: `terms`, `terms-1`, `terms-2`.
#[derive(Default)]
struct AnchorAllocator {
    used: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl AnchorAllocator {
    fn allocate(&mut self, heading: &str) -> String {
        let mut base = slugify(heading);
        if base.is_empty() {
            base = "section".to_owned();
        }
        let suffix = self.next_suffix.entry(base.clone()).or_insert(0);
        loop {
            let candidate = if *suffix == 0 {
                base.clone()
            } else {
                format!("{base}-{suffix}")
            };
            *suffix += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Front matter fields we care about.
#[derive(Default)]
struct FrontMatter {
    title: Option<String>,
    updated: Option<String>,
}

/// Parse a YAML front matter block. Malformed YAML is treated as absent.
fn parse_front_matter(yaml: &str) -> FrontMatter {
    let value: serde_yml::Value = match serde_yml::from_str(yaml) {
        Ok(v) => v,
        Err(_) => return FrontMatter::default(),
    };
    let field = |key: &str| -> Option<String> {
        match value.get(key)? {
            serde_yml::Value::String(s) => Some(s.clone()),
            serde_yml::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };
    FrontMatter {
        title: field("title"),
        updated: field("last_updated").or_else(|| field("effective_date")),
    }
}

/// Scan the source into flat top-level blocks plus any front matter text.
fn collect_blocks(source: &str) -> (Vec<ContentBlock>, Option<String>) {
    let line_index = LineIndex::new(source);

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
    let parser = Parser::new_ext(source, options);

    let mut blocks: Vec<ContentBlock> = Vec::new();
    let mut metadata: Option<String> = None;
    let mut in_metadata = false;

    let mut block_depth: usize = 0;
    let mut current_block: Option<(BlockKind, usize)> = None; // (kind, start_offset)
    let mut text_buf = String::new();

    for (event, range) in parser.into_offset_iter() {
        match &event {
            Event::Start(Tag::MetadataBlock(_)) => {
                in_metadata = true;
                metadata = Some(String::new());
            }
            Event::End(TagEnd::MetadataBlock(_)) => {
                in_metadata = false;
            }
            Event::Text(text) if in_metadata => {
                if let Some(meta) = metadata.as_mut() {
                    meta.push_str(text);
                }
            }

            Event::Start(tag) => {
                if is_block_level(tag) {
                    if block_depth == 0 {
                        if let Some(kind) = tag_to_block_kind(tag) {
                            current_block = Some((kind, range.start));
                            text_buf.clear();
                        }
                    }
                    // Newlines between list items / table rows keep the
                    // flattened content readable.
                    if block_depth >= 1
                        && matches!(tag, Tag::Item | Tag::TableRow | Tag::TableHead)
                        && !text_buf.is_empty()
                        && !text_buf.ends_with('\n')
                    {
                        text_buf.push('\n');
                    }
                    if block_depth >= 1
                        && matches!(tag, Tag::TableCell)
                        && !text_buf.is_empty()
                        && !text_buf.ends_with('\n')
                    {
                        text_buf.push_str(" | ");
                    }
                    block_depth += 1;
                }
            }

            Event::End(tag_end) => {
                if is_block_level_end(tag_end) {
                    block_depth = block_depth.saturating_sub(1);
                    if block_depth == 0 {
                        if let Some((kind, start_offset)) = current_block.take() {
                            let mut content = std::mem::take(&mut text_buf);
                            if matches!(kind, BlockKind::Heading(_)) {
                                content = content.replace('\n', " ");
                            }
                            if matches!(kind, BlockKind::CodeBlock | BlockKind::HtmlBlock) {
                                content.truncate(content.trim_end_matches('\n').len());
                            }
                            blocks.push(ContentBlock {
                                kind,
                                line_start: line_index.line_at(start_offset),
                                content,
                            });
                        }
                        text_buf.clear();
                    }
                }
            }

            Event::Text(text) | Event::Code(text) => {
                text_buf.push_str(text);
            }

            Event::SoftBreak | Event::HardBreak => {
                text_buf.push('\n');
            }

            Event::Html(html) | Event::InlineHtml(html) => {
                text_buf.push_str(html);
            }

            Event::TaskListMarker(done) => {
                text_buf.push_str(if *done { "[x] " } else { "[ ] " });
            }

            Event::Rule => {
                blocks.push(ContentBlock {
                    kind: BlockKind::ThematicBreak,
                    line_start: line_index.line_at(range.start),
                    content: String::new(),
                });
            }

            _ => {}
        }
    }

    (blocks, metadata)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a markdown source string into a [`ContentModel`].
///
/// Headings at `section_level` start sections. The first heading above that
/// level becomes the title when front matter does not supply one; any other
/// heading is kept as an ordinary block.
pub fn parse(source: &str, section_level: u8) -> ContentModel {
    let (blocks, metadata) = collect_blocks(source);
    let front = metadata
        .as_deref()
        .map(parse_front_matter)
        .unwrap_or_default();

    let mut model = ContentModel {
        title: front.title,
        updated: front.updated,
        ..ContentModel::default()
    };
    let mut anchors = AnchorAllocator::default();

    for block in blocks {
        match block.kind {
            BlockKind::Heading(level) if level == section_level => {
                let id = anchors.allocate(&block.content);
                model.sections.push(Section {
                    id,
                    heading: block.content,
                    level,
                    line: block.line_start,
                    blocks: Vec::new(),
                });
            }
            BlockKind::Heading(level)
                if level < section_level
                    && model.title.is_none()
                    && model.sections.is_empty() =>
            {
                model.title = Some(block.content);
            }
            _ => match model.sections.last_mut() {
                Some(section) => section.blocks.push(block),
                None => model.preamble.push(block),
            },
        }
    }

    model
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
