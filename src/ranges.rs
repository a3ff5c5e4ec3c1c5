/// One past the largest byte value; the exclusive upper bound of the alphabet.
pub const ALPHABET_END: u32 = 256;

/// Half-open interval `[lower, upper)` of byte values.
#[derive(Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub struct ByteRange {
	lower: u32,
	upper: u32,
}

/// Sorted list of pairwise disjoint [`ByteRange`]s.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ByteRanges {
	ranges: Vec<ByteRange>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RangeError {
	Empty { lower: u32, upper: u32 },
	OutOfAlphabet { upper: u32 },
	Unsorted { previous: ByteRange, next: ByteRange },
}

impl ByteRange {
	pub fn new(lower: u32, upper: u32) -> Result<Self, RangeError> {
		if lower >= upper {
			return Err(RangeError::Empty { lower, upper });
		}
		if upper > ALPHABET_END {
			return Err(RangeError::OutOfAlphabet { upper });
		}
		Ok(Self { lower, upper })
	}

	pub fn single(byte: u8) -> Self {
		Self {
			lower: u32::from(byte),
			upper: u32::from(byte) + 1,
		}
	}

	pub fn lower(&self) -> u32 {
		self.lower
	}

	pub fn upper(&self) -> u32 {
		self.upper
	}

	pub fn contains(&self, byte: u8) -> bool {
		(self.lower <= u32::from(byte)) && (u32::from(byte) < self.upper)
	}
}

impl ByteRanges {
	pub const fn new() -> Self {
		Self { ranges: Vec::new() }
	}

	/// Takes ranges that are already sorted and disjoint, as an automaton compiler emits them.
	pub fn from_ranges(ranges: Vec<ByteRange>) -> Result<Self, RangeError> {
		for pair in ranges.windows(2) {
			// Touching ranges (`previous.upper == next.lower`) are allowed.
			if pair[0].upper > pair[1].lower {
				return Err(RangeError::Unsorted {
					previous: pair[0],
					next: pair[1],
				});
			}
		}
		Ok(Self { ranges })
	}

	/// Normalizes arbitrary (possibly overlapping, unordered) ranges into their union.
	pub fn union_of(mut ranges: Vec<ByteRange>) -> Self {
		ranges.sort_unstable();

		let mut merged: Vec<ByteRange> = Vec::with_capacity(ranges.len());
		for range in ranges.into_iter() {
			match merged.last_mut() {
				Some(last) if range.lower <= last.upper => {
					last.upper = last.upper.max(range.upper);
				},
				_ => merged.push(range),
			}
		}

		Self { ranges: merged }
	}

	/// Returns the first range containing `byte`, scanning in order.
	pub fn lookup(&self, byte: u8) -> Option<ByteRange> {
		for range in self.ranges.iter() {
			if u32::from(byte) < range.lower {
				// Sorted: nothing further on can contain it.
				return None;
			}
			if range.contains(byte) {
				return Some(*range);
			}
		}
		None
	}

	pub fn matches(&self, byte: u8) -> bool {
		self.lookup(byte).is_some()
	}

	/// All bytes not covered by `self`.
	pub fn complement(&self) -> Self {
		let mut complement: Vec<ByteRange> = Vec::new();

		let mut pos: u32 = 0;
		for &ByteRange { lower, upper } in self.ranges.iter() {
			if pos < lower {
				complement.push(ByteRange { lower: pos, upper: lower });
			}
			pos = upper;
		}

		if pos < ALPHABET_END {
			complement.push(ByteRange {
				lower: pos,
				upper: ALPHABET_END,
			});
		}

		Self { ranges: complement }
	}

	pub fn is_empty(&self) -> bool {
		self.ranges.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = ByteRange> {
		self.ranges.iter().copied()
	}
}

impl From<ByteRange> for ByteRanges {
	fn from(range: ByteRange) -> Self {
		Self { ranges: vec![range] }
	}
}

impl std::fmt::Display for RangeError {
	fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Empty { lower, upper } => fmt.write_fmt(format_args!("empty byte range {lower}..{upper}")),
			Self::OutOfAlphabet { upper } => fmt.write_fmt(format_args!(
				"byte range upper bound {upper} exceeds {ALPHABET_END}"
			)),
			Self::Unsorted { previous, next } => fmt.write_fmt(format_args!(
				"byte range {}..{} overlaps or precedes {}..{}",
				next.lower, next.upper, previous.lower, previous.upper
			)),
		}
	}
}

impl std::error::Error for RangeError {}

#[cfg(test)]
mod test {
	use super::*;

	fn range(lower: u32, upper: u32) -> ByteRange {
		ByteRange::new(lower, upper).unwrap()
	}

	#[test]
	fn new_rejects_bad_bounds() {
		assert_eq!(ByteRange::new(5, 5), Err(RangeError::Empty { lower: 5, upper: 5 }));
		assert_eq!(ByteRange::new(7, 3), Err(RangeError::Empty { lower: 7, upper: 3 }));
		assert_eq!(ByteRange::new(0, 257), Err(RangeError::OutOfAlphabet { upper: 257 }));
		assert!(ByteRange::new(255, 256).is_ok());
	}

	#[test]
	fn lookup() {
		let ranges: ByteRanges =
			ByteRanges::from_ranges(vec![range(u32::from(b'a'), u32::from(b'd')), range(u32::from(b'x'), 256)])
				.unwrap();
		assert_eq!(ranges.lookup(b'a'), Some(range(97, 100)));
		assert_eq!(ranges.lookup(b'c'), Some(range(97, 100)));
		assert_eq!(ranges.lookup(b'd'), None);
		assert_eq!(ranges.lookup(b'`'), None);
		assert_eq!(ranges.lookup(b'x'), Some(range(120, 256)));
		assert_eq!(ranges.lookup(255), Some(range(120, 256)));
		assert!(!ranges.matches(0));
	}

	#[test]
	fn from_ranges_rejects_overlap() {
		let e: RangeError = ByteRanges::from_ranges(vec![range(10, 20), range(15, 30)]).unwrap_err();
		assert_eq!(
			e,
			RangeError::Unsorted {
				previous: range(10, 20),
				next: range(15, 30),
			}
		);
		assert!(ByteRanges::from_ranges(vec![range(10, 20), range(20, 30)]).is_ok());
		assert!(ByteRanges::from_ranges(vec![range(20, 30), range(10, 20)]).is_err());
	}

	#[test]
	fn union_of() {
		let ranges: ByteRanges = ByteRanges::union_of(vec![
			range(20, 30),
			range(10, 15),
			range(25, 40),
			ByteRange::single(15),
			range(50, 51),
		]);
		assert_eq!(ranges.iter().collect::<Vec<_>>(), vec![range(10, 40), range(50, 51)]);
	}

	#[test]
	fn complement() {
		{
			let ranges: ByteRanges = ByteRanges::from_ranges(vec![range(10, 16), range(20, 41)]).unwrap();
			let complement: Vec<ByteRange> = ranges.complement().iter().collect::<Vec<_>>();
			assert_eq!(complement, vec![range(0, 10), range(16, 20), range(41, 256)]);
		}
		{
			let ranges: ByteRanges = ByteRanges::from_ranges(vec![range(0, 1), range(200, 256)]).unwrap();
			let complement: Vec<ByteRange> = ranges.complement().iter().collect::<Vec<_>>();
			assert_eq!(complement, vec![range(1, 200)]);
		}
		{
			assert_eq!(ByteRanges::new().complement().iter().collect::<Vec<_>>(), vec![range(0, 256)]);
			assert!(ByteRanges::from(range(0, 256)).complement().is_empty());
		}
	}
}
