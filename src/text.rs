//! Line-oriented automaton descriptions.
//!
//! ```text
//! # (a)(b*)
//! groups 2
//! 0: tag 0 -> 1
//! 1: range 'a' -> 2
//! 2: tag 1 -> 3
//! 3: tag 2 -> 4
//! 4: split 5 6
//! 5: range 'b' -> 4
//! 6: tag 3 -> 7
//! 7: accept
//! ```
//!
//! States are numbered in order from 0. `root N` picks the start state (default 0).
//! Range items are a byte (`'a'`, `97`, `0x61`), a half-open `lo..hi` (`hi` may be 256),
//! or a negated class `[^ items ]`; the items of one line are unioned.
//! `tag !N` records "unset" for tag `N`.

use std::str::Chars;

use nom::Err as NomErr;
use nom::IResult;
use nom::Parser;
use nom::error::ErrorKind as NomErrorKind;
use nom::error::ParseError;

use crate::nfa::Nfa;
use crate::nfa::NfaError;
use crate::nfa::NfaIdx;
use crate::nfa::NfaState;
use crate::nfa::TagInfo;
use crate::ranges::ALPHABET_END;
use crate::ranges::ByteRange;
use crate::ranges::ByteRanges;
use crate::ranges::RangeError;

#[derive(Debug)]
pub struct TextError<'a> {
	/// 1-based.
	pub line: usize,
	/// Part of the (comment-stripped, trimmed) line before the error.
	pub consumed: &'a str,
	pub remaining: &'a str,
	pub kind: TextErrorKind,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TextErrorKind {
	ExpectedChar(char),
	ExpectedKeyword(&'static str),
	ExpectedNumber,
	NumberTooBig,
	InvalidByte,
	InvalidEscape,
	MissingClose(char, char),
	BadRange(RangeError),
	UnknownState,
	TrailingInput,
	DuplicateDirective(&'static str),
	StateOutOfOrder { expected: usize, found: usize },
	Nom(NomErrorKind),
}

#[derive(Debug)]
pub enum LoadError<'a> {
	Syntax(TextError<'a>),
	Automaton(NfaError),
}

#[derive(Debug)]
struct TextParsingError<'a> {
	pub input: &'a str,
	pub kind: TextErrorKind,
}

enum Line {
	Groups(usize),
	Root(usize),
	State { idx: usize, state: NfaState },
}

type ParsingResult<'a, T> = IResult<&'a str, T, TextParsingError<'a>>;

impl<'a> ParseError<&'a str> for TextParsingError<'a> {
	fn from_error_kind(input: &'a str, nom: NomErrorKind) -> Self {
		Self {
			input,
			kind: TextErrorKind::Nom(nom),
		}
	}

	fn append(_input: &'a str, _kind: NomErrorKind, other: Self) -> Self {
		other
	}
}

impl<'a> TextParsingError<'a> {
	fn new(input: &'a str, kind: TextErrorKind) -> Self {
		Self { input, kind }
	}
}

impl<'a> TextError<'a> {
	fn at(line: usize, text: &'a str, remaining: &'a str, kind: TextErrorKind) -> Self {
		// `remaining` is always a suffix of `text`.
		Self {
			line,
			consumed: &text[..(text.len() - remaining.len())],
			remaining,
			kind,
		}
	}
}

impl Nfa {
	pub fn from_text(text: &str) -> Result<Self, LoadError<'_>> {
		load(text)
	}
}

pub fn load(text: &str) -> Result<Nfa, LoadError<'_>> {
	let mut groups: Option<usize> = None;
	let mut root: Option<usize> = None;
	let mut states: Vec<NfaState> = Vec::new();

	for (i, raw) in text.lines().enumerate() {
		let line_number: usize = i + 1;
		let line: &str = strip_comment(raw).trim();
		if line.is_empty() {
			continue;
		}

		let parsed: Line = match parse_line(line) {
			Ok((_, parsed)) => parsed,
			Err(NomErr::Incomplete(_)) => {
				// Complete parsers only; treat like running off the end of the line.
				return Err(LoadError::Syntax(TextError::at(
					line_number,
					line,
					"",
					TextErrorKind::TrailingInput,
				)));
			},
			Err(NomErr::Error(err) | NomErr::Failure(err)) => {
				return Err(LoadError::Syntax(TextError::at(line_number, line, err.input, err.kind)));
			},
		};

		match parsed {
			Line::Groups(n) => {
				if groups.replace(n).is_some() {
					return Err(LoadError::Syntax(TextError::at(
						line_number,
						line,
						line,
						TextErrorKind::DuplicateDirective("groups"),
					)));
				}
			},
			Line::Root(n) => {
				if root.replace(n).is_some() {
					return Err(LoadError::Syntax(TextError::at(
						line_number,
						line,
						line,
						TextErrorKind::DuplicateDirective("root"),
					)));
				}
			},
			Line::State { idx, state } => {
				if idx != states.len() {
					return Err(LoadError::Syntax(TextError::at(
						line_number,
						line,
						line,
						TextErrorKind::StateOutOfOrder {
							expected: states.len(),
							found: idx,
						},
					)));
				}
				states.push(state);
			},
		}
	}

	debug!("loaded {} states from text", states.len());

	Nfa::new(states, NfaIdx(root.unwrap_or(0)), groups.unwrap_or(0)).map_err(LoadError::Automaton)
}

/// A `#` starts a comment at the start of a line or after whitespace (so `'#'` is a byte).
fn strip_comment(line: &str) -> &str {
	let bytes: &[u8] = line.as_bytes();
	for (i, &b) in bytes.iter().enumerate() {
		if (b == b'#') && ((i == 0) || bytes[i - 1].is_ascii_whitespace()) {
			return &line[..i];
		}
	}
	line
}

fn parse_line(input: &str) -> ParsingResult<'_, Line> {
	use nom::branch::alt;

	let (input, line): (&str, Line) = alt((parse_directive, parse_state)).parse(input)?;
	let (input, _): (&str, &str) = parse_space0(input)?;

	if input.is_empty() {
		Ok((input, line))
	} else {
		Err(NomErr::Failure(TextParsingError::new(
			input,
			TextErrorKind::TrailingInput,
		)))
	}
}

fn parse_directive(input: &str) -> ParsingResult<'_, Line> {
	use nom::branch::alt;
	use nom::combinator::cut;
	use nom::sequence::preceded;

	let (input, keyword): (&str, &str) = alt((parse_keyword("groups"), parse_keyword("root"))).parse(input)?;
	let (input, n): (&str, usize) = cut(preceded(parse_space1, parse_number)).parse(input)?;

	if keyword == "groups" {
		Ok((input, Line::Groups(n)))
	} else {
		Ok((input, Line::Root(n)))
	}
}

fn parse_state(input: &str) -> ParsingResult<'_, Line> {
	use nom::combinator::cut;

	let (input, idx): (&str, usize) = parse_number(input)?;
	let (input, _): (&str, char) = cut(parse_char::<':'>).parse(input)?;
	let (input, _): (&str, &str) = parse_space0(input)?;
	let (input, state): (&str, NfaState) = cut(parse_state_body).parse(input)?;

	Ok((input, Line::State { idx, state }))
}

fn parse_state_body(input: &str) -> ParsingResult<'_, NfaState> {
	use nom::branch::alt;

	alt((
		parse_split,
		parse_pass,
		parse_tag,
		parse_range,
		parse_accept,
		diagnostic_unknown_state,
	))
	.parse(input)
}

// ========================================

fn parse_split(input: &str) -> ParsingResult<'_, NfaState> {
	use nom::combinator::cut;
	use nom::sequence::preceded;

	let (input, _): (&str, &str) = parse_keyword("split").parse(input)?;
	let (input, primary): (&str, usize) = cut(preceded(parse_space1, parse_number)).parse(input)?;
	let (input, secondary): (&str, usize) = cut(preceded(parse_space1, parse_number)).parse(input)?;

	Ok((
		input,
		NfaState::Split {
			primary: NfaIdx(primary),
			secondary: NfaIdx(secondary),
		},
	))
}

fn parse_pass(input: &str) -> ParsingResult<'_, NfaState> {
	use nom::combinator::cut;

	let (input, _): (&str, &str) = parse_keyword("pass").parse(input)?;
	let (input, out): (&str, usize) = cut(parse_arrow).parse(input)?;

	Ok((input, NfaState::Pass { out: NfaIdx(out) }))
}

fn parse_tag(input: &str) -> ParsingResult<'_, NfaState> {
	use nom::combinator::cut;
	use nom::combinator::opt;

	let (input, _): (&str, &str) = parse_keyword("tag").parse(input)?;
	let (input, _): (&str, &str) = cut(parse_space1).parse(input)?;
	let (input, negated): (&str, Option<char>) = opt(parse_char::<'!'>).parse(input)?;

	let before_idx: &str = input;
	let (input, idx): (&str, usize) = cut(parse_number).parse(input)?;
	let Ok(idx): Result<u32, _> = u32::try_from(idx) else {
		return Err(NomErr::Failure(TextParsingError::new(
			before_idx,
			TextErrorKind::NumberTooBig,
		)));
	};

	let (input, out): (&str, usize) = cut(parse_arrow).parse(input)?;

	Ok((
		input,
		NfaState::Tag {
			info: TagInfo {
				idx,
				negated: negated.is_some(),
			},
			out: NfaIdx(out),
		},
	))
}

fn parse_range(input: &str) -> ParsingResult<'_, NfaState> {
	use nom::combinator::cut;
	use nom::multi::many1;
	use nom::sequence::preceded;

	let (input, _): (&str, &str) = parse_keyword("range").parse(input)?;
	let (input, items): (&str, Vec<Vec<ByteRange>>) =
		cut(many1(preceded(parse_space1, parse_range_item))).parse(input)?;
	let (input, out): (&str, usize) = cut(parse_arrow).parse(input)?;

	let ranges: ByteRanges = ByteRanges::union_of(items.into_iter().flatten().collect::<Vec<_>>());

	Ok((input, NfaState::range(ranges, NfaIdx(out))))
}

fn parse_accept(input: &str) -> ParsingResult<'_, NfaState> {
	let (input, _): (&str, &str) = parse_keyword("accept").parse(input)?;
	Ok((input, NfaState::Accept))
}

fn parse_arrow(input: &str) -> ParsingResult<'_, usize> {
	let (input, _): (&str, &str) = parse_space0(input)?;
	let (input, _): (&str, &str) = parse_keyword("->").parse(input)?;
	let (input, _): (&str, &str) = parse_space0(input)?;
	parse_number(input)
}

// ========================================

fn parse_range_item(input: &str) -> ParsingResult<'_, Vec<ByteRange>> {
	use nom::branch::alt;

	alt((parse_negated_class, parse_interval)).parse(input)
}

fn parse_negated_class(input: &str) -> ParsingResult<'_, Vec<ByteRange>> {
	use nom::combinator::cut;
	use nom::multi::many1;
	use nom::sequence::preceded;

	let (input, _): (&str, &str) = parse_keyword("[^").parse(input)?;
	let (input, items): (&str, Vec<Vec<ByteRange>>) =
		cut(many1(preceded(parse_space0, parse_interval))).parse(input)?;
	let (input, _): (&str, &str) = parse_space0(input)?;

	let (input, _): (&str, char) = match parse_char::<']'>(input) {
		Ok(ok) => ok,
		Err(_) => {
			return Err(NomErr::Failure(TextParsingError::new(
				input,
				TextErrorKind::MissingClose('[', ']'),
			)));
		},
	};

	let class: ByteRanges = ByteRanges::union_of(items.into_iter().flatten().collect::<Vec<_>>());
	Ok((input, class.complement().iter().collect::<Vec<_>>()))
}

fn parse_interval(original_input: &str) -> ParsingResult<'_, Vec<ByteRange>> {
	use nom::combinator::cut;
	use nom::combinator::opt;
	use nom::sequence::preceded;

	let (input, lower): (&str, u32) = parse_bound(original_input)?;
	let (input, maybe_upper): (&str, Option<u32>) =
		opt(preceded(parse_keyword(".."), cut(parse_bound))).parse(input)?;

	let range: Result<ByteRange, RangeError> = match maybe_upper {
		Some(upper) => ByteRange::new(lower, upper),
		None => ByteRange::new(lower, lower + 1),
	};

	match range {
		Ok(range) => Ok((input, vec![range])),
		Err(err) => Err(NomErr::Failure(TextParsingError::new(
			original_input,
			TextErrorKind::BadRange(err),
		))),
	}
}

fn parse_bound(input: &str) -> ParsingResult<'_, u32> {
	use nom::branch::alt;

	alt((parse_quoted_byte, parse_numeric_bound)).parse(input)
}

fn parse_numeric_bound(input: &str) -> ParsingResult<'_, u32> {
	let (remaining, n): (&str, usize) = parse_number(input)?;
	match u32::try_from(n) {
		Ok(n) if n <= ALPHABET_END => Ok((remaining, n)),
		_ => Err(NomErr::Failure(TextParsingError::new(
			input,
			TextErrorKind::NumberTooBig,
		))),
	}
}

fn parse_quoted_byte(original_input: &str) -> ParsingResult<'_, u32> {
	use nom::combinator::cut;

	let (input, _): (&str, char) = parse_char::<'\''>(original_input)?;

	// Cut from here on: a quote can only start a byte literal.
	let mut chars: Chars = input.chars();
	let byte: u8 = match chars.next() {
		Some('\\') => match chars.next() {
			Some('n') => b'\n',
			Some('t') => b'\t',
			Some('r') => b'\r',
			Some('0') => b'\0',
			Some('\\') => b'\\',
			Some('\'') => b'\'',
			_ => {
				return Err(NomErr::Failure(TextParsingError::new(
					input,
					TextErrorKind::InvalidEscape,
				)));
			},
		},
		Some(ch) if ch.is_ascii() && (ch != '\'') => ch as u8,
		_ => {
			return Err(NomErr::Failure(TextParsingError::new(
				input,
				TextErrorKind::InvalidByte,
			)));
		},
	};

	let (input, _): (&str, char) = cut(parse_char::<'\''>).parse(chars.as_str())?;

	Ok((input, u32::from(byte)))
}

// ========================================

/// Decimal, or hexadecimal with a `0x` prefix.
fn parse_number(input: &str) -> ParsingResult<'_, usize> {
	use nom::character::complete::digit1;
	use nom::character::complete::hex_digit1;

	let (digits, radix): (&str, u32) = match input.strip_prefix("0x") {
		Some(hex) => (hex, 16),
		None => (input, 10),
	};

	let lexed: ParsingResult<'_, &str> = if radix == 16 { hex_digit1(digits) } else { digit1(digits) };

	match lexed {
		Ok((remaining, lexeme)) => match usize::from_str_radix(lexeme, radix) {
			Ok(n) => Ok((remaining, n)),
			Err(_) => Err(NomErr::Error(TextParsingError::new(
				input,
				TextErrorKind::NumberTooBig,
			))),
		},
		Err(err @ NomErr::Incomplete(_)) => {
			// Propagate
			Err(err)
		},
		Err(NomErr::Error(_) | NomErr::Failure(_)) => Err(NomErr::Error(TextParsingError::new(
			input,
			TextErrorKind::ExpectedNumber,
		))),
	}
}

fn parse_keyword<'a>(keyword: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = TextParsingError<'a>> {
	move |input: &'a str| -> ParsingResult<'a, &'a str> {
		match input.strip_prefix(keyword) {
			Some(remaining) => Ok((remaining, &input[..keyword.len()])),
			None => Err(NomErr::Error(TextParsingError::new(
				input,
				TextErrorKind::ExpectedKeyword(keyword),
			))),
		}
	}
}

fn parse_char<const CHAR: char>(input: &str) -> ParsingResult<'_, char> {
	let mut chars: Chars = input.chars();

	if let Some(ch) = chars.next() {
		if ch == CHAR {
			return Ok((chars.as_str(), ch));
		}
	}

	Err(NomErr::Error(TextParsingError::new(
		input,
		TextErrorKind::ExpectedChar(CHAR),
	)))
}

fn parse_space0(input: &str) -> ParsingResult<'_, &str> {
	nom::character::complete::space0(input)
}

fn parse_space1(input: &str) -> ParsingResult<'_, &str> {
	nom::character::complete::space1(input)
}

fn diagnostic_unknown_state(input: &str) -> ParsingResult<'_, NfaState> {
	Err(NomErr::Error(TextParsingError::new(input, TextErrorKind::UnknownState)))
}

// ==================================

impl std::fmt::Display for TextErrorKind {
	fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::ExpectedChar(ch) => fmt.write_fmt(format_args!("expected {ch:?}")),
			Self::ExpectedKeyword(keyword) => fmt.write_fmt(format_args!("expected {keyword:?}")),
			Self::ExpectedNumber => fmt.write_str("expected a number"),
			Self::NumberTooBig => fmt.write_str("number too big"),
			Self::InvalidByte => fmt.write_str("expected one ASCII character"),
			Self::InvalidEscape => fmt.write_str("invalid escape"),
			Self::MissingClose(open, close) => fmt.write_fmt(format_args!("{open:?} without {close:?}")),
			Self::BadRange(err) => fmt.write_fmt(format_args!("{err}")),
			Self::UnknownState => fmt.write_str("expected split, pass, tag, range or accept"),
			Self::TrailingInput => fmt.write_str("unexpected trailing input"),
			Self::DuplicateDirective(directive) => fmt.write_fmt(format_args!("{directive:?} given twice")),
			Self::StateOutOfOrder { expected, found } => {
				fmt.write_fmt(format_args!("expected state {expected}, found state {found}"))
			},
			Self::Nom(kind) => fmt.write_fmt(format_args!("{}", kind.description())),
		}
	}
}

impl std::fmt::Display for TextError<'_> {
	fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		fmt.write_fmt(format_args!(
			"line {}: {} after {:?}, at {:?}",
			self.line, self.kind, self.consumed, self.remaining
		))
	}
}

impl std::fmt::Display for LoadError<'_> {
	fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Syntax(err) => fmt.write_fmt(format_args!("{err}")),
			Self::Automaton(err) => fmt.write_fmt(format_args!("{err}")),
		}
	}
}

impl std::error::Error for TextError<'_> {}

impl std::error::Error for LoadError<'_> {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Syntax(_) => None,
			Self::Automaton(err) => Some(err),
		}
	}
}
