//! Text of the documents the client has opened.

use std::collections::HashMap;

use lsp_types::{Position, TextDocumentContentChangeEvent, Uri};
use parking_lot::RwLock;
use tracing::debug;

use crate::encoding::OffsetEncoding;

/// An open document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Document {
	language_id: String,
	version: i32,
	text: String,
}

/// Open documents keyed by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
	docs: RwLock<HashMap<Uri, Document>>,
}

impl DocumentStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records an opened document, replacing any earlier copy.
	pub fn open(&self, uri: Uri, language_id: String, version: i32, text: String) {
		self.docs.write().insert(
			uri,
			Document {
				language_id,
				version,
				text,
			},
		);
	}

	/// Applies content changes in order. Changes to unknown documents are ignored.
	pub fn change(
		&self,
		uri: &Uri,
		version: i32,
		changes: Vec<TextDocumentContentChangeEvent>,
		encoding: OffsetEncoding,
	) {
		let mut docs = self.docs.write();
		let Some(doc) = docs.get_mut(uri) else {
			debug!(uri = uri.as_str(), "lsp.document.change_unknown");
			return;
		};
		for change in changes {
			match change.range {
				Some(range) => {
					let start = offset_of(&doc.text, range.start, encoding);
					let end = offset_of(&doc.text, range.end, encoding).max(start);
					doc.text.replace_range(start..end, &change.text);
				}
				None => doc.text = change.text,
			}
		}
		doc.version = version;
	}

	/// Forgets a closed document.
	pub fn close(&self, uri: &Uri) {
		self.docs.write().remove(uri);
	}

	/// Whether a document is open.
	pub fn contains(&self, uri: &Uri) -> bool {
		self.docs.read().contains_key(uri)
	}

	/// Latest version seen for a document.
	pub fn version(&self, uri: &Uri) -> Option<i32> {
		self.docs.read().get(uri).map(|doc| doc.version)
	}

	/// Language identifier a document was opened with.
	pub fn language_id(&self, uri: &Uri) -> Option<String> {
		self.docs.read().get(uri).map(|doc| doc.language_id.clone())
	}

	/// Text of line `index` without its terminator, or `None` past the last line.
	pub fn line(&self, uri: &Uri, index: u32) -> Option<String> {
		let docs = self.docs.read();
		let doc = docs.get(uri)?;
		nth_line(&doc.text, index as usize).map(str::to_owned)
	}
}

fn nth_line(text: &str, index: usize) -> Option<&str> {
	text.split('\n')
		.nth(index)
		.map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Byte offset of an LSP position in `text`, clamped to the line and the text.
fn offset_of(text: &str, pos: Position, encoding: OffsetEncoding) -> usize {
	let mut start = 0;
	for _ in 0..pos.line {
		match text[start..].find('\n') {
			Some(nl) => start += nl + 1,
			None => return text.len(),
		}
	}
	let rest = &text[start..];
	let line = nth_line(rest, 0).unwrap_or(rest);
	start + encoding.byte_offset(line, pos.character)
}
