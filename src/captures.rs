use std::ops::Range;

/// Offset value for a boundary that was never recorded.
pub const UNSET: isize = -1;

/// `(start, end)` byte offsets into the input; [`UNSET`] on both sides means "no submatch".
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub struct Span {
	pub start: isize,
	pub end: isize,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Captures {
	whole: Span,
	groups: Vec<Span>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum MatchResult {
	Matched(Captures),
	NoMatch,
}

impl Span {
	pub const UNSET: Self = Self {
		start: UNSET,
		end: UNSET,
	};

	pub const fn new(start: isize, end: isize) -> Self {
		Self { start, end }
	}

	pub fn is_set(&self) -> bool {
		(self.start != UNSET) && (self.end != UNSET)
	}

	pub fn range(&self) -> Option<Range<usize>> {
		if self.is_set() {
			Some((self.start as usize)..(self.end as usize))
		} else {
			None
		}
	}
}

impl Captures {
	/// `offsets` holds `(start, end)` pairs, one per group, in group order.
	pub(crate) fn from_offsets(end: usize, offsets: &[isize]) -> Self {
		Self {
			whole: Span::new(0, end as isize),
			groups: offsets
				.chunks_exact(2)
				.map(|pair| Span::new(pair[0], pair[1]))
				.collect::<Vec<_>>(),
		}
	}

	pub fn whole(&self) -> Span {
		self.whole
	}

	/// Reported groups, group 1 first.
	pub fn groups(&self) -> &[Span] {
		&self.groups
	}

	/// Group `i`, where 0 is the whole match.
	pub fn get(&self, i: usize) -> Option<Span> {
		if i == 0 {
			Some(self.whole)
		} else {
			self.groups.get(i - 1).copied()
		}
	}

	/// The bytes of group `i` in `input`, if it participated.
	pub fn slice<'input>(&self, input: &'input [u8], i: usize) -> Option<&'input [u8]> {
		self.get(i)?.range().and_then(|range| input.get(range))
	}
}

impl MatchResult {
	pub fn is_match(&self) -> bool {
		matches!(self, Self::Matched(..))
	}

	pub fn captures(&self) -> Option<&Captures> {
		match self {
			Self::Matched(captures) => Some(captures),
			Self::NoMatch => None,
		}
	}

	pub fn into_captures(self) -> Option<Captures> {
		match self {
			Self::Matched(captures) => Some(captures),
			Self::NoMatch => None,
		}
	}
}

impl std::fmt::Display for Span {
	fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.is_set() {
			fmt.write_fmt(format_args!("{}..{}", self.start, self.end))
		} else {
			fmt.write_str("unset")
		}
	}
}
