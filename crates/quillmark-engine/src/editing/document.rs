use crate::editing::node::{Block, BlockKind, Node, NodeKey, Text};
use std::ops::Range;
use thiserror::Error;

/// Error from a structural edit.
///
/// Lookups that miss raise [`EditError::NotFound`]; edits whose structural
/// preconditions do not hold raise [`EditError::InvalidOperation`]. Either
/// way the input document is untouched, so a failed edit never leaves a
/// half-applied tree behind.
#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("node not found: {key}")]
    NotFound { key: NodeKey },
    #[error("invalid operation: {reason}")]
    InvalidOperation { reason: String },
}

impl EditError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }
}

/// Immutable document tree.
///
/// The document owns the ordered list of top level blocks. Every mutation
/// method takes `&self` and returns a new `Document`; nodes on the path to
/// the edit are rebuilt, everything else is shared with the previous value
/// through the `Arc`s inside [`Node`]. Old documents stay valid, which is
/// what makes transform application atomic: either the caller gets a fully
/// built new tree, or an error and the old one.
///
/// Structural rules, checked by [`Document::from_nodes`]:
/// - every top level node is a [`Block`],
/// - a block's children are either all blocks or all inline content
///   (texts and inlines), never a mix,
/// - inlines contain only texts and inlines.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Document holding a single empty paragraph, the smallest editable tree.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::block(BlockKind::Paragraph, vec![Text::empty().into()])],
        }
    }

    /// Build a document from top level blocks, validating the structural
    /// rules above.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, EditError> {
        if nodes.is_empty() {
            return Err(EditError::invalid("document has no blocks"));
        }
        for node in &nodes {
            if !node.is_block() {
                return Err(EditError::invalid("top level nodes must be blocks"));
            }
            validate_subtree(node)?;
        }
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Path of child indices from the top level down to `key`.
    pub fn path_to(&self, key: NodeKey) -> Option<Vec<usize>> {
        fn walk(nodes: &[Node], key: NodeKey, path: &mut Vec<usize>) -> bool {
            for (i, node) in nodes.iter().enumerate() {
                path.push(i);
                if node.key() == key {
                    return true;
                }
                if let Some(children) = node.children() {
                    if walk(children, key, path) {
                        return true;
                    }
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(&self.nodes, key, &mut path).then_some(path)
    }

    pub fn node_at_path(&self, path: &[usize]) -> Option<&Node> {
        let (&first, rest) = path.split_first()?;
        let mut node = self.nodes.get(first)?;
        for &i in rest {
            node = node.children()?.get(i)?;
        }
        Some(node)
    }

    pub fn get_node(&self, key: NodeKey) -> Option<&Node> {
        let path = self.path_to(key)?;
        self.node_at_path(&path)
    }

    /// Parent node of `key`, or `None` when `key` is a top level block or
    /// absent.
    pub fn get_parent(&self, key: NodeKey) -> Option<&Node> {
        let path = self.path_to(key)?;
        if path.len() < 2 {
            return None;
        }
        self.node_at_path(&path[..path.len() - 1])
    }

    /// Ancestor chain of `key`, outermost first, not including the node
    /// itself.
    pub fn ancestors(&self, key: NodeKey) -> Vec<&Node> {
        let Some(path) = self.path_to(key) else {
            return Vec::new();
        };
        (1..path.len())
            .filter_map(|depth| self.node_at_path(&path[..depth]))
            .collect()
    }

    /// Innermost ancestor block of `key` matching the predicate.
    pub fn get_closest(&self, key: NodeKey, pred: impl Fn(&Block) -> bool) -> Option<&Block> {
        self.ancestors(key)
            .into_iter()
            .rev()
            .filter_map(Node::as_block)
            .find(|block| pred(block))
    }

    /// The block directly containing `key`'s inline content. For a text leaf
    /// this is the lowest block above it.
    pub fn closest_block(&self, key: NodeKey) -> Option<&Block> {
        self.get_closest(key, |_| true)
    }

    pub fn get_previous_sibling(&self, key: NodeKey) -> Option<&Node> {
        let (siblings, index) = self.siblings_of(key)?;
        index.checked_sub(1).and_then(|i| siblings.get(i))
    }

    pub fn get_next_sibling(&self, key: NodeKey) -> Option<&Node> {
        let (siblings, index) = self.siblings_of(key)?;
        siblings.get(index + 1)
    }

    fn siblings_of(&self, key: NodeKey) -> Option<(&[Node], usize)> {
        let path = self.path_to(key)?;
        let (last, parent_path) = path.split_last()?;
        let siblings = if parent_path.is_empty() {
            &self.nodes[..]
        } else {
            self.node_at_path(parent_path)?.children()?
        };
        Some((siblings, *last))
    }

    /// Every text leaf in document order.
    pub fn texts(&self) -> Vec<&Text> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Text>) {
            for node in nodes {
                match node {
                    Node::Text(t) => out.push(t),
                    _ => walk(node.children().unwrap_or(&[]), out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// First text leaf under `key` (or `key` itself when it is a text).
    pub fn first_text(&self, key: NodeKey) -> Option<&Text> {
        fn first<'a>(node: &'a Node) -> Option<&'a Text> {
            match node {
                Node::Text(t) => Some(t),
                _ => node.children()?.iter().find_map(first),
            }
        }
        first(self.get_node(key)?)
    }

    /// Last text leaf under `key` (or `key` itself when it is a text).
    pub fn last_text(&self, key: NodeKey) -> Option<&Text> {
        fn last<'a>(node: &'a Node) -> Option<&'a Text> {
            match node {
                Node::Text(t) => Some(t),
                _ => node.children()?.iter().rev().find_map(last),
            }
        }
        last(self.get_node(key)?)
    }

    /// Text leaf after `key` in document order.
    pub fn next_text(&self, key: NodeKey) -> Option<&Text> {
        let texts = self.texts();
        let pos = texts.iter().position(|t| t.key == key)?;
        texts.get(pos + 1).copied()
    }

    /// Text leaf before `key` in document order.
    pub fn previous_text(&self, key: NodeKey) -> Option<&Text> {
        let texts = self.texts();
        let pos = texts.iter().position(|t| t.key == key)?;
        pos.checked_sub(1).and_then(|i| texts.get(i)).copied()
    }

    /// Character offset of the start of text leaf `key` within its block.
    pub fn offset_of_text_in_block(&self, key: NodeKey) -> Option<usize> {
        let block = self.closest_block(key)?;
        let mut offset = 0;
        for leaf in subtree_texts(&block.nodes) {
            if leaf.key == key {
                return Some(offset);
            }
            offset += leaf.len_chars();
        }
        None
    }

    /// Leaf and local offset for a character position within block `block`,
    /// counted from the block start. A position on a leaf boundary resolves
    /// to the start of the later leaf; the block's total length resolves to
    /// the end of its last leaf.
    pub fn text_at_block_offset(
        &self,
        block: NodeKey,
        offset: usize,
    ) -> Option<(NodeKey, usize)> {
        let node = self.get_node(block)?;
        let texts = subtree_texts(&node.as_block()?.nodes);
        let mut remaining = offset;
        for (idx, leaf) in texts.iter().enumerate() {
            let len = leaf.len_chars();
            let is_last = idx == texts.len() - 1;
            if remaining < len || (is_last && remaining == len) {
                return Some((leaf.key, remaining));
            }
            remaining -= len;
        }
        None
    }

    /// Blocks that directly contain inline content, in document order. These
    /// are the blocks a cursor can sit in.
    pub fn leaf_blocks(&self) -> Vec<&Block> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Block>) {
            for node in nodes {
                if let Node::Block(block) = node {
                    if block.nodes.iter().any(Node::is_block) {
                        walk(&block.nodes, out);
                    } else {
                        out.push(block);
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    // ========================================================================
    // Structural builders
    // ========================================================================

    /// Replace `at` within the children of the node at `parent_path` (the
    /// top level when the path is empty) with `replacement`. Every other
    /// builder funnels through this.
    pub(crate) fn splice_children(
        &self,
        parent_path: &[usize],
        at: Range<usize>,
        replacement: Vec<Node>,
    ) -> Result<Document, EditError> {
        let siblings = if parent_path.is_empty() {
            &self.nodes[..]
        } else {
            self.node_at_path(parent_path)
                .ok_or_else(|| EditError::invalid("splice parent path out of range"))?
                .children()
                .ok_or_else(|| EditError::invalid("cannot splice children of a text leaf"))?
        };
        if at.start > at.end || at.end > siblings.len() {
            return Err(EditError::invalid("splice range out of range"));
        }

        fn splice(
            nodes: &[Node],
            parent_path: &[usize],
            at: &Range<usize>,
            replacement: &mut Option<Vec<Node>>,
        ) -> Vec<Node> {
            match parent_path.split_first() {
                None => {
                    let repl = replacement.take().unwrap_or_default();
                    let mut out = Vec::with_capacity(nodes.len() + repl.len());
                    out.extend_from_slice(&nodes[..at.start]);
                    out.extend(repl);
                    out.extend_from_slice(&nodes[at.end..]);
                    out
                }
                Some((&idx, rest)) => nodes
                    .iter()
                    .enumerate()
                    .map(|(i, node)| {
                        if i == idx {
                            let children = node.children().unwrap_or(&[]);
                            node.with_children(splice(children, rest, at, replacement))
                        } else {
                            node.clone()
                        }
                    })
                    .collect(),
            }
        }

        Ok(Document {
            nodes: splice(&self.nodes, parent_path, &at, &mut Some(replacement)),
        })
    }

    /// Insert `node` as child `index` of `parent`.
    pub fn insert_node(
        &self,
        parent: NodeKey,
        index: usize,
        node: Node,
    ) -> Result<Document, EditError> {
        let path = self.path_to(parent).ok_or(EditError::NotFound { key: parent })?;
        let parent_node = self
            .node_at_path(&path)
            .ok_or(EditError::NotFound { key: parent })?;
        let children = parent_node
            .children()
            .ok_or_else(|| EditError::invalid("cannot insert under a text leaf"))?;
        if index > children.len() {
            return Err(EditError::invalid("insert index out of range"));
        }
        if parent_node.is_inline() && node.is_block() {
            return Err(EditError::invalid("cannot insert a block inside an inline"));
        }
        self.splice_children(&path, index..index, vec![node])
    }

    /// Remove the node at `key`. The final remaining top level block cannot
    /// be removed; a document always holds at least one block.
    pub fn remove_node(&self, key: NodeKey) -> Result<Document, EditError> {
        let path = self.path_to(key).ok_or(EditError::NotFound { key })?;
        if path.len() == 1 && self.nodes.len() == 1 {
            return Err(EditError::invalid("cannot remove the last block"));
        }
        let (last, parent_path) = path.split_last().expect("path is never empty");
        self.splice_children(parent_path, *last..*last + 1, Vec::new())
    }

    /// Replace the subtree at `key` with `node`.
    pub fn replace_node(&self, key: NodeKey, node: Node) -> Result<Document, EditError> {
        let path = self.path_to(key).ok_or(EditError::NotFound { key })?;
        let (last, parent_path) = path.split_last().expect("path is never empty");
        self.splice_children(parent_path, *last..*last + 1, vec![node])
    }

    /// Retype the block at `key`, preserving its identity and children.
    pub fn set_node_kind(&self, key: NodeKey, kind: BlockKind) -> Result<Document, EditError> {
        let node = self.get_node(key).ok_or(EditError::NotFound { key })?;
        if !node.is_block() {
            return Err(EditError::invalid("only blocks can be retyped"));
        }
        let retyped = node.with_kind(kind);
        self.replace_node(key, retyped)
    }

    /// Merge the block at `key` into its previous sibling. The sibling keeps
    /// its identity and receives the merged children; texts that meet at the
    /// seam with equal marks are joined into one leaf.
    pub fn merge_node(&self, key: NodeKey) -> Result<Document, EditError> {
        let node = self.get_node(key).ok_or(EditError::NotFound { key })?;
        let block = node
            .as_block()
            .ok_or_else(|| EditError::invalid("only blocks can be merged"))?;
        let prev = self
            .get_previous_sibling(key)
            .ok_or_else(|| EditError::invalid("no previous sibling to merge into"))?;
        let prev_block = prev
            .as_block()
            .ok_or_else(|| EditError::invalid("previous sibling is not a block"))?;

        let merged = join_children(prev_block.nodes.clone(), block.nodes.clone());
        let merged_node = prev.with_children(merged);

        let path = self.path_to(key).ok_or(EditError::NotFound { key })?;
        let (last, parent_path) = path.split_last().expect("path is never empty");
        self.splice_children(parent_path, *last - 1..*last + 1, vec![merged_node])
    }

    /// Split the block `block` in two at character `offset` of its text leaf
    /// `text`. The leading half keeps the block's identity; the trailing
    /// half is a new sibling of the same kind. Returns the new sibling's
    /// key.
    pub fn split_block_at(
        &self,
        block: NodeKey,
        text: NodeKey,
        offset: usize,
    ) -> Result<(Document, NodeKey), EditError> {
        let node = self.get_node(block).ok_or(EditError::NotFound { key: block })?;
        let block_node = node
            .as_block()
            .ok_or_else(|| EditError::invalid("only blocks can be split"))?;
        let leaf = self.get_node(text).ok_or(EditError::NotFound { key: text })?;
        let leaf = leaf
            .as_text()
            .ok_or_else(|| EditError::invalid("split point must be a text leaf"))?;
        if offset > leaf.len_chars() {
            return Err(EditError::invalid("split offset beyond text end"));
        }

        let (left, right) = split_children(&block_node.nodes, text, offset)
            .ok_or_else(|| EditError::invalid("split point is not inside the block"))?;
        let first = node.with_children(left);
        let second: Node = Block::new(block_node.kind.clone(), right).into();
        let second_key = second.key();

        let path = self.path_to(block).ok_or(EditError::NotFound { key: block })?;
        let (last, parent_path) = path.split_last().expect("path is never empty");
        let doc = self.splice_children(parent_path, *last..*last + 1, vec![first, second])?;
        Ok((doc, second_key))
    }

    /// Split the text leaf at `key` into two sibling leaves at `offset`. The
    /// leading half keeps the key; returns the trailing half's key.
    pub fn split_text_at(
        &self,
        key: NodeKey,
        offset: usize,
    ) -> Result<(Document, NodeKey), EditError> {
        let node = self.get_node(key).ok_or(EditError::NotFound { key })?;
        let leaf = node
            .as_text()
            .ok_or_else(|| EditError::invalid("only text leaves can be split"))?;
        if offset > leaf.len_chars() {
            return Err(EditError::invalid("split offset beyond text end"));
        }
        let at = leaf.byte_of_char(offset);
        let first: Node = Text::with_key(leaf.key, &leaf.text[..at], leaf.marks.clone()).into();
        let second: Node = Text::with_marks(&leaf.text[at..], leaf.marks.clone()).into();
        let second_key = second.key();

        let path = self.path_to(key).ok_or(EditError::NotFound { key })?;
        let (last, parent_path) = path.split_last().expect("path is never empty");
        let doc = self.splice_children(parent_path, *last..*last + 1, vec![first, second])?;
        Ok((doc, second_key))
    }

    /// Insert `text` at character `offset` of the leaf at `key`.
    pub fn insert_text_at(
        &self,
        key: NodeKey,
        offset: usize,
        text: &str,
    ) -> Result<Document, EditError> {
        let node = self.get_node(key).ok_or(EditError::NotFound { key })?;
        let leaf = node
            .as_text()
            .ok_or_else(|| EditError::invalid("text can only be inserted into a leaf"))?;
        if offset > leaf.len_chars() {
            return Err(EditError::invalid("insert offset beyond text end"));
        }
        let at = leaf.byte_of_char(offset);
        let mut content = leaf.text.clone();
        content.insert_str(at, text);
        self.replace_node(key, Text::with_key(leaf.key, content, leaf.marks.clone()).into())
    }

    /// Remove `count` characters starting at character `offset` of the leaf
    /// at `key`.
    pub fn remove_text_at(
        &self,
        key: NodeKey,
        offset: usize,
        count: usize,
    ) -> Result<Document, EditError> {
        let node = self.get_node(key).ok_or(EditError::NotFound { key })?;
        let leaf = node
            .as_text()
            .ok_or_else(|| EditError::invalid("text can only be removed from a leaf"))?;
        if offset + count > leaf.len_chars() {
            return Err(EditError::invalid("remove range beyond text end"));
        }
        let from = leaf.byte_of_char(offset);
        let to = leaf.byte_of_char(offset + count);
        let mut content = leaf.text.clone();
        content.replace_range(from..to, "");
        self.replace_node(key, Text::with_key(leaf.key, content, leaf.marks.clone()).into())
    }

    /// Remove everything between two points, given in document order. Within
    /// one leaf this trims the leaf; across leaves it trims the boundary
    /// leaves and drops what lies between; across blocks it additionally
    /// joins the end block's remainder into the start block and prunes
    /// containers emptied by the removal. The start leaf always survives, so
    /// a caller can collapse the selection onto `(start, start_offset)`
    /// afterwards.
    pub fn delete_between(
        &self,
        start: (NodeKey, usize),
        end: (NodeKey, usize),
    ) -> Result<Document, EditError> {
        let (st, so) = start;
        let (et, eo) = end;
        let start_leaf = self
            .get_node(st)
            .and_then(Node::as_text)
            .ok_or(EditError::NotFound { key: st })?;
        let end_leaf = self
            .get_node(et)
            .and_then(Node::as_text)
            .ok_or(EditError::NotFound { key: et })?;
        if so > start_leaf.len_chars() || eo > end_leaf.len_chars() {
            return Err(EditError::invalid("delete range beyond text end"));
        }

        if st == et {
            if so > eo {
                return Err(EditError::invalid("delete range is backwards"));
            }
            return self.remove_text_at(st, so, eo - so);
        }

        let b1 = self
            .closest_block(st)
            .ok_or_else(|| EditError::invalid("start leaf has no containing block"))?;
        let b2 = self
            .closest_block(et)
            .ok_or_else(|| EditError::invalid("end leaf has no containing block"))?;
        let (b1_key, b2_key) = (b1.key, b2.key);

        if b1_key == b2_key {
            let children = excise(&b1.nodes, st, so, et, eo)
                .ok_or_else(|| EditError::invalid("delete range is backwards"))?;
            let rebuilt = self
                .get_node(b1_key)
                .expect("block was just looked up")
                .with_children(children);
            return self.replace_node(b1_key, rebuilt);
        }

        // Cross-block: join the end block's remainder onto the trimmed start
        // block, then drop everything that lay strictly between plus the end
        // block itself, and finally prune containers the removal emptied.
        let head = keep_head(&b1.nodes, st, so)
            .ok_or_else(|| EditError::invalid("start leaf is not inside its block"))?;
        let tail = keep_tail(&b2.nodes, et, eo)
            .ok_or_else(|| EditError::invalid("end leaf is not inside its block"))?;
        let merged = join_children(head, tail);

        let leaf_order: Vec<NodeKey> = self.leaf_blocks().iter().map(|b| b.key).collect();
        let p1 = leaf_order.iter().position(|k| *k == b1_key);
        let p2 = leaf_order.iter().position(|k| *k == b2_key);
        let (Some(p1), Some(p2)) = (p1, p2) else {
            return Err(EditError::invalid("delete endpoints are not in leaf blocks"));
        };
        if p1 > p2 {
            return Err(EditError::invalid("delete range is backwards"));
        }
        let removed: Vec<NodeKey> = leaf_order[p1 + 1..=p2].to_vec();

        // Ancestors of removed blocks, deepest first, so emptied wrappers
        // are pruned before their own parents are considered.
        let mut candidates: Vec<(usize, NodeKey)> = Vec::new();
        for key in &removed {
            if let Some(path) = self.path_to(*key) {
                for depth in 1..path.len() {
                    if let Some(node) = self.node_at_path(&path[..depth]) {
                        let entry = (depth, node.key());
                        if !candidates.contains(&entry) {
                            candidates.push(entry);
                        }
                    }
                }
            }
        }
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        let rebuilt = self
            .get_node(b1_key)
            .expect("block was just looked up")
            .with_children(merged);
        let mut doc = self.replace_node(b1_key, rebuilt)?;
        for key in removed {
            doc = doc.remove_node(key)?;
        }
        for (_, key) in candidates {
            let emptied = doc
                .get_node(key)
                .is_some_and(|n| n.children().is_some_and(<[Node]>::is_empty));
            if emptied {
                doc = doc.remove_node(key)?;
            }
        }
        Ok(doc)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_subtree(node: &Node) -> Result<(), EditError> {
    let Some(children) = node.children() else {
        return Ok(());
    };
    let blocks = children.iter().filter(|n| n.is_block()).count();
    if blocks > 0 && blocks < children.len() {
        return Err(EditError::invalid("block mixes block and inline children"));
    }
    if node.is_inline() && blocks > 0 {
        return Err(EditError::invalid("inline contains a block"));
    }
    for child in children {
        validate_subtree(child)?;
    }
    Ok(())
}

fn subtree_texts(nodes: &[Node]) -> Vec<&Text> {
    let mut out = Vec::new();
    fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Text>) {
        for node in nodes {
            match node {
                Node::Text(t) => out.push(t),
                _ => walk(node.children().unwrap_or(&[]), out),
            }
        }
    }
    walk(nodes, &mut out);
    out
}

fn contains_key(node: &Node, key: NodeKey) -> bool {
    if node.key() == key {
        return true;
    }
    node.children()
        .is_some_and(|children| children.iter().any(|c| contains_key(c, key)))
}

/// Concatenate two child lists, joining texts that meet at the seam when
/// their marks are equal. The left side of the seam keeps its key.
fn join_children(mut left: Vec<Node>, right: Vec<Node>) -> Vec<Node> {
    let mut right = right.into_iter();
    if let (Some(Node::Text(a)), Some(Node::Text(b))) = (left.last(), right.as_slice().first()) {
        if a.marks == b.marks {
            let joined = Text::with_key(a.key, format!("{}{}", a.text, b.text), a.marks.clone());
            let end = left.len() - 1;
            left[end] = joined.into();
            right.next();
        }
    }
    left.extend(right);
    left
}

/// Divide a child list in two at `(text, offset)`. The split leaf's leading
/// half keeps its key; containers on the split path keep their key on the
/// left and get a fresh one on the right.
fn split_children(nodes: &[Node], text: NodeKey, offset: usize) -> Option<(Vec<Node>, Vec<Node>)> {
    let idx = nodes.iter().position(|n| contains_key(n, text))?;
    let mut left: Vec<Node> = nodes[..idx].to_vec();
    let mut right: Vec<Node> = nodes[idx + 1..].to_vec();
    match &nodes[idx] {
        Node::Text(t) => {
            let at = t.byte_of_char(offset);
            left.push(Text::with_key(t.key, &t.text[..at], t.marks.clone()).into());
            right.insert(0, Text::with_marks(&t.text[at..], t.marks.clone()).into());
        }
        container => {
            let (l, r) = split_children(container.children()?, text, offset)?;
            left.push(container.with_children(l));
            right.insert(0, rekeyed_container(container, r)?);
        }
    }
    Some((left, right))
}

fn rekeyed_container(node: &Node, children: Vec<Node>) -> Option<Node> {
    match node {
        Node::Block(b) => Some(Node::block(b.kind.clone(), children)),
        Node::Inline(i) => Some(Node::inline(i.kind.clone(), children)),
        Node::Text(_) => None,
    }
}

/// Children of a subtree up to `(key, offset)`: siblings before the leaf's
/// branch intact, the leaf trimmed to its leading `offset` characters,
/// everything after dropped. Containers on the path keep their identity.
fn keep_head(nodes: &[Node], key: NodeKey, offset: usize) -> Option<Vec<Node>> {
    let idx = nodes.iter().position(|n| contains_key(n, key))?;
    let mut out: Vec<Node> = nodes[..idx].to_vec();
    match &nodes[idx] {
        Node::Text(t) => {
            let at = t.byte_of_char(offset);
            out.push(Text::with_key(t.key, &t.text[..at], t.marks.clone()).into());
        }
        container => {
            let inner = keep_head(container.children()?, key, offset)?;
            out.push(container.with_children(inner));
        }
    }
    Some(out)
}

/// Children of a subtree from `(key, offset)` on: the leaf trimmed to its
/// trailing remainder, siblings after its branch intact, everything before
/// dropped.
fn keep_tail(nodes: &[Node], key: NodeKey, offset: usize) -> Option<Vec<Node>> {
    let idx = nodes.iter().position(|n| contains_key(n, key))?;
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len() - idx);
    match &nodes[idx] {
        Node::Text(t) => {
            let at = t.byte_of_char(offset);
            out.push(Text::with_key(t.key, &t.text[at..], t.marks.clone()).into());
        }
        container => {
            let inner = keep_tail(container.children()?, key, offset)?;
            out.push(container.with_children(inner));
        }
    }
    out.extend_from_slice(&nodes[idx + 1..]);
    Some(out)
}

/// Remove the range `(st, so)..(et, eo)` from a child list containing both
/// leaves. Returns `None` when the end leaf precedes the start leaf.
fn excise(nodes: &[Node], st: NodeKey, so: usize, et: NodeKey, eo: usize) -> Option<Vec<Node>> {
    let i = nodes.iter().position(|n| contains_key(n, st))?;
    let j = nodes.iter().position(|n| contains_key(n, et))?;
    if j < i {
        return None;
    }
    if i == j {
        // Both leaves live under the same child, which must be a container
        // since the same-leaf case is handled before excise is called.
        let child = &nodes[i];
        let inner = excise(child.children()?, st, so, et, eo)?;
        let mut out: Vec<Node> = nodes[..i].to_vec();
        out.push(child.with_children(inner));
        out.extend_from_slice(&nodes[i + 1..]);
        return Some(out);
    }
    let mut head: Vec<Node> = nodes[..i].to_vec();
    head.extend(keep_head(&nodes[i..=i], st, so)?);
    let mut tail = keep_tail(&nodes[j..=j], et, eo)?;
    tail.extend_from_slice(&nodes[j + 1..]);
    Some(join_children(head, tail))
}

// ============================================================================
// Tests
// ============================================================================
