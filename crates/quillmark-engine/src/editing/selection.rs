use crate::editing::document::Document;
use crate::editing::node::NodeKey;
use std::cmp::Ordering;

/// A position in the document: a text leaf plus a character offset into it.
/// Offset `0` is before the first character; an offset equal to the leaf's
/// length is after the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }

    /// Point at the start of the first text leaf under `key`.
    pub fn start_of(doc: &Document, key: NodeKey) -> Option<Self> {
        doc.first_text(key).map(|t| Self::new(t.key, 0))
    }

    /// Point at the end of the last text leaf under `key`.
    pub fn end_of(doc: &Document, key: NodeKey) -> Option<Self> {
        doc.last_text(key).map(|t| Self::new(t.key, t.len_chars()))
    }

    /// Document order of two points. `None` when either leaf is absent from
    /// the document.
    pub fn compare(doc: &Document, a: Point, b: Point) -> Option<Ordering> {
        let pa = doc.path_to(a.key)?;
        let pb = doc.path_to(b.key)?;
        Some(pa.cmp(&pb).then(a.offset.cmp(&b.offset)))
    }
}

/// The user's selection: an `anchor` where it began and a `focus` where it
/// ends. The two coincide for a caret (collapsed selection); a focus before
/// the anchor in document order makes the selection backward. All movement
/// methods are pure and return the moved selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    /// Caret at `point`.
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    /// First of anchor and focus in document order.
    pub fn start(&self, doc: &Document) -> Option<Point> {
        match Point::compare(doc, self.anchor, self.focus)? {
            Ordering::Greater => Some(self.focus),
            _ => Some(self.anchor),
        }
    }

    /// Last of anchor and focus in document order.
    pub fn end(&self, doc: &Document) -> Option<Point> {
        match Point::compare(doc, self.anchor, self.focus)? {
            Ordering::Greater => Some(self.anchor),
            _ => Some(self.focus),
        }
    }

    /// Whether the focus precedes the anchor.
    pub fn is_backward(&self, doc: &Document) -> Option<bool> {
        Some(Point::compare(doc, self.anchor, self.focus)? == Ordering::Greater)
    }

    pub fn move_to(self, anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn move_anchor_to(self, point: Point) -> Self {
        Self {
            anchor: point,
            ..self
        }
    }

    pub fn move_focus_to(self, point: Point) -> Self {
        Self {
            focus: point,
            ..self
        }
    }

    /// Extend the selection by moving the focus only. The anchor never
    /// moves, so extending past it flips the selection backward rather than
    /// failing.
    pub fn extend_to(self, point: Point) -> Self {
        self.move_focus_to(point)
    }

    pub fn collapse_to_anchor(self) -> Self {
        Self::collapsed(self.anchor)
    }

    pub fn collapse_to_focus(self) -> Self {
        Self::collapsed(self.focus)
    }

    /// Collapse onto the document-order start of the selection.
    pub fn collapse_to_start(self, doc: &Document) -> Option<Self> {
        self.start(doc).map(Self::collapsed)
    }

    /// Collapse onto the document-order end of the selection.
    pub fn collapse_to_end(self, doc: &Document) -> Option<Self> {
        self.end(doc).map(Self::collapsed)
    }
}
