use serde::Deserialize;
use serde::Serialize;

use crate::CancellationToken;
use crate::TextConstResult;

/// Number of asset lines shown in a documentation preview before it is
/// truncated.
pub const MAX_PREVIEW_LINES: usize = 10;

/// An external text file available to the generator.
///
/// Two assets are equal when both their path and content are equal. A
/// `content` of `None` marks an asset that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextAsset {
	pub path: String,
	pub content: Option<String>,
}

impl TextAsset {
	pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			content: Some(content.into()),
		}
	}

	pub fn unreadable(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			content: None,
		}
	}
}

/// The derived form of a [`TextAsset`]: its documentation preview and the
/// escaped body of its string constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformedAsset {
	pub path: String,
	/// Escaped preview lines, one entry per documentation line. `None` only
	/// when the asset was unreadable.
	pub doc_lines: Option<Vec<String>>,
	/// Asset text with every `"` doubled.
	pub constant_body: String,
}

/// Transform one asset into its preview and constant body.
pub fn transform_asset(
	asset: &TextAsset,
	cancellation: &CancellationToken,
) -> TextConstResult<TransformedAsset> {
	let Some(content) = &asset.content else {
		return Ok(TransformedAsset {
			path: asset.path.clone(),
			doc_lines: None,
			constant_body: String::new(),
		});
	};

	let lines = split_lines(content);
	let line_count = lines.len();
	let mut doc_lines = Vec::with_capacity(line_count.min(MAX_PREVIEW_LINES + 1));

	for line in lines {
		cancellation.check()?;

		// Truncate after ten lines, but show an eleventh line rather than a
		// summary of "1 more lines".
		if doc_lines.len() >= MAX_PREVIEW_LINES && line_count > MAX_PREVIEW_LINES + 1 {
			doc_lines.push(format!("... {} more lines", line_count - doc_lines.len()));
			break;
		}

		doc_lines.push(escape_for_doc_comment(line));
	}

	Ok(TransformedAsset {
		path: asset.path.clone(),
		doc_lines: Some(doc_lines),
		constant_body: escape_for_constant(content),
	})
}

/// Split text into lines on `\r\n`, `\n`, `\r`, NEL (U+0085), LINE
/// SEPARATOR (U+2028) or PARAGRAPH SEPARATOR (U+2029).
///
/// Text ending with a line break yields a trailing empty line and empty text
/// yields a single empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
	let mut lines = Vec::new();
	let mut chars = text.char_indices().peekable();
	let mut start = 0;

	while let Some((index, ch)) = chars.next() {
		let end = match ch {
			'\r' => {
				match chars.peek() {
					Some(&(next, '\n')) => {
						chars.next();
						next + 1
					}
					_ => index + 1,
				}
			}
			'\n' | '\u{85}' | '\u{2028}' | '\u{2029}' => index + ch.len_utf8(),
			_ => continue,
		};
		lines.push(&text[start..index]);
		start = end;
	}

	lines.push(&text[start..]);
	lines
}

/// Escape a line for embedding in an XML documentation comment.
pub fn escape_for_doc_comment(line: &str) -> String {
	// `&` goes first so the entities introduced below are left alone.
	line.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&apos;")
}

/// Escape text for a verbatim string literal by doubling every `"`.
pub fn escape_for_constant(text: &str) -> String {
	text.replace('"', "\"\"")
}
