use std::collections::BTreeMap;
use std::ops::Range;

use logos::Logos;

use crate::MtabError;
use crate::MtabResult;
use crate::Tag;

/// Raw tokens produced by logos for the interior of a single `<...>` span.
#[derive(Logos, Debug, PartialEq)]
enum RawToken {
	#[token("</")]
	CloserOpen,
	#[token("<")]
	Open,
	#[token(">")]
	Close,
	#[token("/")]
	Slash,
	#[token("=")]
	Equals,
	#[regex(r"[ \t\r\n]+")]
	Whitespace,
	#[regex(r#""[^"]*""#)]
	DoubleQuotedString,
	#[regex(r"'[^']*'")]
	SingleQuotedString,
	#[regex(r#"[^ \t\r\n<>/="']+"#)]
	Word,
}

/// Walks the logos token stream of one tag span, collecting the type and the
/// attribute pairs.
struct TagWalker<'a> {
	/// The source text of the tag span, including the angle brackets.
	source: &'a str,
	/// The collected raw tokens and their byte spans.
	raw_tokens: Vec<(Result<RawToken, ()>, Range<usize>)>,
	/// Current index into `raw_tokens`.
	cursor: usize,
}

impl<'a> TagWalker<'a> {
	fn new(source: &'a str) -> Self {
		let raw_tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			source,
			raw_tokens,
			cursor: 0,
		}
	}

	fn malformed(&self, reason: &str) -> MtabError {
		MtabError::MalformedTag {
			tag: self.source.to_string(),
			reason: reason.to_string(),
		}
	}

	fn peek(&self) -> Option<&Result<RawToken, ()>> {
		self.raw_tokens.get(self.cursor).map(|(token, _)| token)
	}

	fn current_slice(&self) -> &'a str {
		let (_, span) = &self.raw_tokens[self.cursor];
		&self.source[span.clone()]
	}

	fn skip_whitespace(&mut self) {
		while matches!(self.peek(), Some(Ok(RawToken::Whitespace))) {
			self.cursor += 1;
		}
	}

	/// Read an attribute value: a quoted string with its quotes stripped, or a
	/// bare word.
	fn read_value(&mut self) -> Option<String> {
		let value = match self.peek() {
			Some(Ok(RawToken::DoubleQuotedString | RawToken::SingleQuotedString)) => {
				let slice = self.current_slice();
				slice[1..slice.len() - 1].to_string()
			}
			Some(Ok(RawToken::Word)) => self.current_slice().to_string(),
			_ => return None,
		};

		self.cursor += 1;
		Some(value)
	}

	fn process(mut self) -> MtabResult<Tag> {
		let is_closer = match self.peek() {
			Some(Ok(RawToken::CloserOpen)) => true,
			Some(Ok(RawToken::Open)) => false,
			_ => return Err(self.malformed("a tag must start with `<`")),
		};
		self.cursor += 1;
		self.skip_whitespace();

		let tag_type = match self.peek() {
			Some(Ok(RawToken::Word)) => self.current_slice().to_string(),
			_ => return Err(self.malformed("missing tag type")),
		};
		self.cursor += 1;

		let mut attributes = BTreeMap::new();
		let mut is_self_closing = false;

		loop {
			self.skip_whitespace();

			let Some(token) = self.peek() else {
				return Err(MtabError::UnterminatedTag(self.source.to_string()));
			};

			match token {
				Ok(RawToken::Close) => break,
				Ok(RawToken::Slash) => {
					self.cursor += 1;
					is_self_closing = matches!(self.peek(), Some(Ok(RawToken::Close)));
				}
				Ok(RawToken::Word) => {
					let key = self.current_slice().to_string();
					self.cursor += 1;
					self.skip_whitespace();

					let value = if matches!(self.peek(), Some(Ok(RawToken::Equals))) {
						self.cursor += 1;
						self.skip_whitespace();
						self.read_value().unwrap_or_default()
					} else {
						String::new()
					};

					attributes.insert(key, value);
				}
				// Stray quotes, equals signs and nested `<` carry no meaning.
				Ok(_) | Err(()) => {
					self.cursor += 1;
				}
			}
		}

		if is_closer {
			return Ok(Tag::closer(tag_type));
		}

		attributes.insert("type".to_string(), tag_type.clone());

		Ok(Tag::from_parts(tag_type, attributes, false, is_self_closing))
	}
}

/// Tokenize exactly one `<...>` span into a [`Tag`].
pub(crate) fn tokenize_tag(raw: &str) -> MtabResult<Tag> {
	TagWalker::new(raw.trim()).process()
}

/// Find the byte offset of the `>` that closes the tag starting at the
/// beginning of `source`. A `>` inside a quoted attribute value does not
/// count.
pub(crate) fn find_tag_end(source: &str) -> Option<usize> {
	let mut quote: Option<char> = None;

	for (index, ch) in source.char_indices() {
		match (quote, ch) {
			(None, '"' | '\'') => quote = Some(ch),
			(Some(open), _) if open == ch => quote = None,
			(None, '>') => return Some(index),
			_ => {}
		}
	}

	None
}
