//! Document management for the Kickstart language server
//!
//! Keeps a synchronized copy of every open document and applies
//! incremental edits as the editor sends them.

use dashmap::DashMap;
use ropey::Rope;
use tower_lsp::lsp_types::*;

/// An open Kickstart document
#[derive(Debug, Clone)]
pub struct KickstartDocument {
    /// Document URI
    pub uri: Url,
    /// Document version
    pub version: i32,
    content: Rope,
}

/// Text and version of a document at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub uri: Url,
    pub version: i32,
    pub text: String,
}

impl KickstartDocument {
    pub fn new(uri: Url, content: &str, version: i32) -> Self {
        Self {
            uri,
            version,
            content: Rope::from_str(content),
        }
    }

    /// Apply content changes in order and record the new version.
    pub fn apply_changes(&mut self, changes: Vec<TextDocumentContentChangeEvent>, version: i32) {
        for change in changes {
            self.apply_change(change);
        }
        self.version = version;
    }

    fn apply_change(&mut self, change: TextDocumentContentChangeEvent) {
        let Some(range) = change.range else {
            self.content = Rope::from_str(&change.text);
            return;
        };

        let start = char_index(&self.content, range.start);
        let end = char_index(&self.content, range.end).max(start);
        self.content.remove(start..end);
        self.content.insert(start, &change.text);
    }

    /// Get document text
    pub fn text(&self) -> String {
        self.content.to_string()
    }

    /// Text of the line containing `position`, up to the cursor.
    pub fn line_prefix(&self, position: Position) -> Option<String> {
        line_prefix(&self.content, position)
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            uri: self.uri.clone(),
            version: self.version,
            text: self.text(),
        }
    }
}

/// Char index of an LSP position (UTF-16 columns), clamped to the text.
fn char_index(rope: &Rope, position: Position) -> usize {
    let line = position.line as usize;
    if line >= rope.len_lines() {
        return rope.len_chars();
    }

    let line_start = rope.line_to_char(line);
    let slice = rope.line(line);
    let mut line_end = slice.len_chars();
    while line_end > 0 && matches!(slice.char(line_end - 1), '\n' | '\r') {
        line_end -= 1;
    }

    let max_units = slice.char_to_utf16_cu(line_end);
    let units = (position.character as usize).min(max_units);
    line_start + slice.utf16_cu_to_char(units)
}

fn line_prefix(rope: &Rope, position: Position) -> Option<String> {
    let line = position.line as usize;
    if line >= rope.len_lines() {
        return None;
    }
    let start = rope.line_to_char(line);
    let end = char_index(rope, position);
    Some(rope.slice(start..end).to_string())
}

/// Line prefix in text that is not held in the store.
pub fn line_prefix_of(text: &str, position: Position) -> Option<String> {
    line_prefix(&Rope::from_str(text), position)
}

/// Document store for all open documents
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, KickstartDocument>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, item: TextDocumentItem) -> DocumentSnapshot {
        let doc = KickstartDocument::new(item.uri.clone(), &item.text, item.version);
        let snapshot = doc.snapshot();
        self.documents.insert(item.uri, doc);
        snapshot
    }

    /// Apply changes to an open document. `None` if it is not open.
    pub fn change(
        &self,
        uri: &Url,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Option<DocumentSnapshot> {
        let mut doc = self.documents.get_mut(uri)?;
        doc.apply_changes(changes, version);
        Some(doc.snapshot())
    }

    pub fn close(&self, uri: &Url) -> bool {
        self.documents.remove(uri).is_some()
    }

    pub fn get(&self, uri: &Url) -> Option<KickstartDocument> {
        self.documents.get(uri).map(|doc| doc.value().clone())
    }

    pub fn snapshot(&self, uri: &Url) -> Option<DocumentSnapshot> {
        self.documents.get(uri).map(|doc| doc.snapshot())
    }

    /// Snapshots of every open document.
    pub fn snapshots(&self) -> Vec<DocumentSnapshot> {
        self.documents.iter().map(|doc| doc.snapshot()).collect()
    }
}
