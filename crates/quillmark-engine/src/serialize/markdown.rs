//! Markdown interchange.
//!
//! Import walks the `pulldown-cmark` event stream into a document tree.
//! Headings, paragraphs, block quotes, lists and the bold/italic/code/
//! strikethrough marks map onto the editable kinds; fenced code blocks and
//! thematic breaks come through as pass-through kinds so nothing in the
//! source is silently dropped. Link and image spans keep their visible text
//! but lose their targets, since the document model carries no attribute
//! data.
//!
//! Export is a hand-rolled writer for the same shapes. Metacharacters in
//! text are not escaped, so a literal `*` in a leaf will re-import as
//! emphasis.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::editing::{
    BlockKind, Document, EditError, Inline, InlineKind, Mark, MarkSet, Node, Text,
};

const CODE_BLOCK: &str = "code-block";
const THEMATIC_BREAK: &str = "thematic-break";

/// Parse markdown text into a document.
pub fn from_markdown(input: &str) -> Result<Document, EditError> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(input, options) {
        builder.handle(event);
    }
    builder.finish()
}

/// Render a document as markdown. No trailing newline; callers writing
/// files append one.
pub fn to_markdown(document: &Document) -> String {
    let groups: Vec<String> = document
        .nodes()
        .iter()
        .filter_map(|node| Some(block_lines(node)?.join("\n")))
        .collect();
    groups.join("\n\n")
}

fn heading_level_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

// ===== Import =====

enum FrameKind {
    Block(BlockKind),
    Inline(InlineKind),
}

struct Frame {
    kind: FrameKind,
    children: Vec<Node>,
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    top: Vec<Node>,
    marks: MarkSet,
    /// Nesting depth inside a construct we do not model (raw HTML blocks).
    skip_depth: usize,
}

impl TreeBuilder {
    fn handle(&mut self, event: Event<'_>) {
        if self.skip_depth > 0 {
            match event {
                Event::Start(_) => self.skip_depth += 1,
                Event::End(_) => self.skip_depth -= 1,
                _ => {}
            }
            return;
        }
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push_text(&text, self.marks.clone()),
            Event::Code(code) => {
                let mut marks = self.marks.clone();
                marks.insert(Mark::Code);
                self.push_text(&code, marks);
            }
            Event::SoftBreak | Event::HardBreak => self.push_text(" ", self.marks.clone()),
            Event::Rule => self.attach(Node::block(
                BlockKind::Other(THEMATIC_BREAK.to_string()),
                vec![Node::text("")],
            )),
            Event::Html(_) | Event::InlineHtml(_) => {}
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open_block(BlockKind::Paragraph),
            Tag::Heading { level, .. } => self.open_block(BlockKind::Heading {
                level: heading_level_number(level),
            }),
            Tag::BlockQuote(_) => self.open_block(BlockKind::BlockQuote),
            // ordered lists flatten to the one list kind the editor has
            Tag::List(_) => self.open_block(BlockKind::BulletedList),
            Tag::Item => self.open_block(BlockKind::ListItem),
            Tag::CodeBlock(_) => self.open_block(BlockKind::Other(CODE_BLOCK.to_string())),
            Tag::Emphasis => {
                self.marks.insert(Mark::Italic);
            }
            Tag::Strong => {
                self.marks.insert(Mark::Bold);
            }
            Tag::Strikethrough => {
                self.marks.insert(Mark::Strikethrough);
            }
            Tag::Link { .. } => self.open_inline(InlineKind::Link),
            Tag::Image { .. } => self.open_inline(InlineKind::Other("image".to_string())),
            _ => self.skip_depth += 1,
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::CodeBlock => self.close_block(),
            TagEnd::Emphasis => {
                self.marks.remove(&Mark::Italic);
            }
            TagEnd::Strong => {
                self.marks.remove(&Mark::Bold);
            }
            TagEnd::Strikethrough => {
                self.marks.remove(&Mark::Strikethrough);
            }
            TagEnd::Link | TagEnd::Image => self.close_inline(),
            _ => {}
        }
    }

    fn open_block(&mut self, kind: BlockKind) {
        self.stack.push(Frame {
            kind: FrameKind::Block(kind),
            children: Vec::new(),
        });
    }

    fn open_inline(&mut self, kind: InlineKind) {
        self.stack.push(Frame {
            kind: FrameKind::Inline(kind),
            children: Vec::new(),
        });
    }

    fn close_block(&mut self) {
        let Some(frame) = self.stack.pop() else { return };
        let FrameKind::Block(kind) = frame.kind else {
            return;
        };
        if let Some(node) = finish_block(kind, frame.children) {
            self.attach(node);
        }
    }

    fn close_inline(&mut self) {
        let Some(frame) = self.stack.pop() else { return };
        let FrameKind::Inline(kind) = frame.kind else {
            return;
        };
        if frame.children.is_empty() {
            return;
        }
        self.attach(Inline::new(kind, frame.children).into());
    }

    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => frame.children.push(node),
            None => self.top.push(node),
        }
    }

    fn push_text(&mut self, text: &str, marks: MarkSet) {
        if text.is_empty() {
            return;
        }
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        let merge = matches!(
            frame.children.last(),
            Some(Node::Text(last)) if last.marks == marks
        );
        if merge {
            if let Some(Node::Text(last)) = frame.children.pop() {
                let combined = format!("{}{}", last.text, text);
                frame
                    .children
                    .push(Text::with_key(last.key, combined, marks).into());
            }
            return;
        }
        frame.children.push(Text::with_marks(text, marks).into());
    }

    fn finish(mut self) -> Result<Document, EditError> {
        while let Some(frame) = self.stack.pop() {
            match frame.kind {
                FrameKind::Block(kind) => {
                    if let Some(node) = finish_block(kind, frame.children) {
                        self.attach(node);
                    }
                }
                FrameKind::Inline(kind) => {
                    if !frame.children.is_empty() {
                        self.attach(Inline::new(kind, frame.children).into());
                    }
                }
            }
        }
        if self.top.is_empty() {
            return Ok(Document::new());
        }
        Document::from_nodes(self.top)
    }
}

/// Normalize a finished block. Lists with no items vanish; wrappers around a
/// single paragraph collapse so short content edits as a leaf block; blocks
/// mixing loose text with child blocks get the text wrapped in paragraphs.
fn finish_block(kind: BlockKind, children: Vec<Node>) -> Option<Node> {
    let mut children = wrap_loose_runs(children);
    match &kind {
        BlockKind::BulletedList if children.is_empty() => return None,
        BlockKind::ListItem | BlockKind::BlockQuote => {
            let single_paragraph = children.len() == 1
                && children[0]
                    .as_block()
                    .is_some_and(|b| b.kind == BlockKind::Paragraph);
            if single_paragraph {
                let inner = children[0]
                    .as_block()
                    .map(|b| b.nodes.clone())
                    .unwrap_or_default();
                children = inner;
            }
        }
        BlockKind::Other(name) if name == CODE_BLOCK => {
            trim_trailing_newline(&mut children);
        }
        _ => {}
    }
    if children.is_empty() {
        children.push(Node::text(""));
    }
    Some(Node::block(kind, children))
}

fn wrap_loose_runs(children: Vec<Node>) -> Vec<Node> {
    let has_block = children.iter().any(Node::is_block);
    if !has_block || children.iter().all(Node::is_block) {
        return children;
    }
    let mut out = Vec::new();
    let mut run: Vec<Node> = Vec::new();
    for child in children {
        if child.is_block() {
            if !run.is_empty() {
                out.push(Node::block(BlockKind::Paragraph, std::mem::take(&mut run)));
            }
            out.push(child);
        } else {
            run.push(child);
        }
    }
    if !run.is_empty() {
        out.push(Node::block(BlockKind::Paragraph, run));
    }
    out
}

fn trim_trailing_newline(children: &mut Vec<Node>) {
    let trimmed = match children.last() {
        Some(Node::Text(last)) if last.text.ends_with('\n') => Text::with_key(
            last.key,
            last.text.trim_end_matches('\n'),
            last.marks.clone(),
        ),
        _ => return,
    };
    children.pop();
    children.push(trimmed.into());
}

// ===== Export =====

fn block_lines(node: &Node) -> Option<Vec<String>> {
    let block = node.as_block()?;
    match &block.kind {
        BlockKind::Paragraph => Some(vec![inline_markdown(&block.nodes)]),
        BlockKind::Heading { level } => Some(vec![format!(
            "{} {}",
            "#".repeat((*level).clamp(1, 6) as usize),
            inline_markdown(&block.nodes)
        )]),
        BlockKind::BlockQuote => Some(
            child_lines(&block.nodes)
                .into_iter()
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {line}")
                    }
                })
                .collect(),
        ),
        BlockKind::BulletedList => {
            let mut lines = Vec::new();
            for item in &block.nodes {
                lines.extend(item_lines(item));
            }
            (!lines.is_empty()).then_some(lines)
        }
        BlockKind::ListItem => Some(item_lines(node)),
        BlockKind::Other(name) if name == THEMATIC_BREAK => Some(vec!["---".to_string()]),
        BlockKind::Other(name) if name == CODE_BLOCK => {
            let mut lines = vec!["```".to_string()];
            lines.extend(block.text().lines().map(str::to_string));
            lines.push("```".to_string());
            Some(lines)
        }
        BlockKind::Other(_) => Some(vec![inline_markdown(&block.nodes)]),
    }
}

fn child_lines(children: &[Node]) -> Vec<String> {
    if !children.iter().any(Node::is_block) {
        return vec![inline_markdown(children)];
    }
    let mut lines = Vec::new();
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(block_lines(child).unwrap_or_default());
    }
    lines
}

fn item_lines(node: &Node) -> Vec<String> {
    let Some(block) = node.as_block() else {
        return Vec::new();
    };
    child_lines(&block.nodes)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("- {line}")
            } else if line.is_empty() {
                line
            } else {
                format!("  {line}")
            }
        })
        .collect()
}

fn inline_markdown(children: &[Node]) -> String {
    let mut out = String::new();
    for child in children {
        match child {
            Node::Text(t) => out.push_str(&marked_run(t)),
            Node::Inline(i) => out.push_str(&inline_markdown(&i.nodes)),
            Node::Block(_) => {}
        }
    }
    out
}

fn marked_run(text: &Text) -> String {
    let mut out = text.text.clone();
    if text.marks.contains(&Mark::Code) {
        out = format!("`{out}`");
    }
    if text.marks.contains(&Mark::Italic) {
        out = format!("*{out}*");
    }
    if text.marks.contains(&Mark::Bold) {
        out = format!("**{out}**");
    }
    if text.marks.contains(&Mark::Strikethrough) {
        out = format!("~~{out}~~");
    }
    // underline has no markdown spelling and is dropped
    out
}
