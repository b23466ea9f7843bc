//! Conversion between LSP positions and byte offsets within a line.

use lsp_types::PositionEncodingKind;

/// Unit in which the `character` field of an LSP position is counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OffsetEncoding {
	/// UTF-8 byte offsets.
	Utf8,
	/// UTF-16 code unit offsets (LSP default).
	#[default]
	Utf16,
	/// UTF-32 / Unicode codepoint offsets.
	Utf32,
}

impl OffsetEncoding {
	/// Parse from LSP position encoding kind.
	pub fn from_lsp(kind: &PositionEncodingKind) -> Option<Self> {
		match kind.as_str() {
			"utf-8" => Some(Self::Utf8),
			"utf-16" => Some(Self::Utf16),
			"utf-32" => Some(Self::Utf32),
			_ => None,
		}
	}

	/// The LSP position encoding kind for this encoding.
	pub fn to_lsp(self) -> PositionEncodingKind {
		match self {
			Self::Utf8 => PositionEncodingKind::UTF8,
			Self::Utf16 => PositionEncodingKind::UTF16,
			Self::Utf32 => PositionEncodingKind::UTF32,
		}
	}

	/// Picks the encoding to use from the kinds a client offers.
	///
	/// Lines are stored as UTF-8, so that is taken when offered. Otherwise UTF-16, which every
	/// client must support.
	pub fn negotiate(offered: Option<&[PositionEncodingKind]>) -> Self {
		let offered = offered.unwrap_or_default();
		if offered.iter().any(|kind| Self::from_lsp(kind) == Some(Self::Utf8)) {
			Self::Utf8
		} else {
			Self::Utf16
		}
	}

	/// Byte offset within `line` of the LSP `character` column.
	///
	/// Columns past the end of the line clamp to its length. A column in the middle of a
	/// character resolves to the start of the next character.
	pub fn byte_offset(self, line: &str, character: u32) -> usize {
		let target = character as usize;
		let mut units = 0;
		for (idx, ch) in line.char_indices() {
			if units >= target {
				return idx;
			}
			units += self.width(ch);
		}
		line.len()
	}

	/// LSP column of the byte offset `byte` within `line`, clamped to the line length.
	pub fn character(self, line: &str, byte: usize) -> u32 {
		let units: usize = line
			.char_indices()
			.take_while(|&(idx, _)| idx < byte)
			.map(|(_, ch)| self.width(ch))
			.sum();
		u32::try_from(units).unwrap_or(u32::MAX)
	}

	fn width(self, ch: char) -> usize {
		match self {
			Self::Utf8 => ch.len_utf8(),
			Self::Utf16 => ch.len_utf16(),
			Self::Utf32 => 1,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn from_lsp_known_kinds() {
		assert_eq!(OffsetEncoding::from_lsp(&PositionEncodingKind::UTF8), Some(OffsetEncoding::Utf8));
		assert_eq!(OffsetEncoding::from_lsp(&PositionEncodingKind::UTF16), Some(OffsetEncoding::Utf16));
		assert_eq!(OffsetEncoding::from_lsp(&PositionEncodingKind::UTF32), Some(OffsetEncoding::Utf32));
		assert_eq!(OffsetEncoding::from_lsp(&PositionEncodingKind::new("utf-7")), None);
	}

	#[test]
	fn negotiate_prefers_utf8() {
		let offered = [PositionEncodingKind::UTF16, PositionEncodingKind::UTF8];
		assert_eq!(OffsetEncoding::negotiate(Some(&offered)), OffsetEncoding::Utf8);
		assert_eq!(OffsetEncoding::negotiate(Some(&offered[..1])), OffsetEncoding::Utf16);
		assert_eq!(OffsetEncoding::negotiate(None), OffsetEncoding::Utf16);
	}

	#[test]
	fn utf16_with_emoji() {
		// U+1F600 is 4 bytes in UTF-8 and 2 code units in UTF-16.
		let line = "a\u{1F600}b";
		let enc = OffsetEncoding::Utf16;
		assert_eq!(enc.byte_offset(line, 1), 1);
		assert_eq!(enc.byte_offset(line, 3), 5);
		assert_eq!(enc.character(line, 5), 3);
		assert_eq!(enc.character(line, 6), 4);
	}

	#[test]
	fn utf8_with_multibyte() {
		let line = "caf\u{00E9}!";
		let enc = OffsetEncoding::Utf8;
		assert_eq!(enc.byte_offset(line, 3), 3);
		assert_eq!(enc.byte_offset(line, 5), 5);
		assert_eq!(enc.character(line, 5), 5);
	}

	#[test]
	fn utf32_counts_codepoints() {
		let line = "\u{00E9}\u{1F600}x";
		let enc = OffsetEncoding::Utf32;
		assert_eq!(enc.byte_offset(line, 2), 6);
		assert_eq!(enc.character(line, 6), 2);
	}

	#[test]
	fn past_end_clamps() {
		let enc = OffsetEncoding::Utf16;
		assert_eq!(enc.byte_offset("abc", 10), 3);
		assert_eq!(enc.character("abc", 10), 3);
		assert_eq!(enc.byte_offset("", 0), 0);
	}
}
