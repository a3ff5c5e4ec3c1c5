use crate::captures::MatchResult;
use crate::options::MatchOptions;
use crate::ranges::ByteRanges;
use crate::simulation::MatchContext;

/// A compiled tagged NFA.
///
/// Immutable once built; all per-match bookkeeping lives in
/// [`MatchContext`], so one `Nfa` can be matched from many threads at once.
#[derive(Debug, Clone)]
pub struct Nfa {
	states: Vec<NfaState>,
	root: NfaIdx,
	/// Number of capture groups, not counting the implicit whole match.
	groups: usize,
	/// Number of thread slots (one per [`NfaState::Range`]).
	slots: usize,
}

#[derive(Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NfaIdx(pub usize);

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NfaState {
	/// Two silent edges; `primary` has priority over `secondary`.
	Split { primary: NfaIdx, secondary: NfaIdx },
	Pass { out: NfaIdx },
	/// Records a capture boundary at the current position, then moves on silently.
	Tag { info: TagInfo, out: NfaIdx },
	/// Consumes one byte in `ranges`.
	/// `slot` is assigned by [`Nfa::new`]; whatever the caller passes is overwritten.
	Range {
		ranges: ByteRanges,
		out: NfaIdx,
		slot: usize,
	},
	Accept,
}

/// Which offset a [`NfaState::Tag`] writes, and whether it writes "unset" instead of the position.
///
/// Group `g` (1-based) owns offsets `2(g-1)` (start) and `2(g-1)+1` (end).
#[derive(Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TagInfo {
	pub idx: u32,
	pub negated: bool,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NfaError {
	NoStates,
	RootOutOfBounds { root: NfaIdx, states: usize },
	EdgeOutOfBounds { from: NfaIdx, to: NfaIdx, states: usize },
	TagOutOfBounds { state: NfaIdx, tag: u32, groups: usize },
	EmptyRange { state: NfaIdx },
	/// More groups than `u32` tag indices can name, or offset records too large to address.
	TooManyGroups { groups: usize },
}

/// Largest group count whose tags (`2·groups` of them) all fit a `u32` index.
pub const MAX_GROUPS: usize = (u32::MAX / 2) as usize;

impl Nfa {
	pub fn new(mut states: Vec<NfaState>, root: NfaIdx, groups: usize) -> Result<Self, NfaError> {
		if states.is_empty() {
			return Err(NfaError::NoStates);
		}
		let n: usize = states.len();
		if root.0 >= n {
			return Err(NfaError::RootOutOfBounds { root, states: n });
		}
		if groups > MAX_GROUPS {
			return Err(NfaError::TooManyGroups { groups });
		}

		let mut slots: usize = 0;
		for (i, state) in states.iter_mut().enumerate() {
			let from: NfaIdx = NfaIdx(i);
			for to in state.successors() {
				if to.0 >= n {
					return Err(NfaError::EdgeOutOfBounds { from, to, states: n });
				}
			}
			match state {
				NfaState::Tag { info, .. } => {
					if info.idx as usize >= 2 * groups {
						return Err(NfaError::TagOutOfBounds {
							state: from,
							tag: info.idx,
							groups,
						});
					}
				},
				NfaState::Range { ranges, slot, .. } => {
					if ranges.is_empty() {
						return Err(NfaError::EmptyRange { state: from });
					}
					*slot = slots;
					slots += 1;
				},
				NfaState::Split { .. } | NfaState::Pass { .. } | NfaState::Accept => (),
			}
		}

		// Every match allocates `slots` records of `2·groups` offsets.
		if slots.max(1).checked_mul(2 * groups).is_none() {
			return Err(NfaError::TooManyGroups { groups });
		}

		debug!("built nfa: {n} states, {groups} groups, {slots} thread slots");

		Ok(Self {
			states,
			root,
			groups,
			// The initial thread reads the "previous step" offsets of slot 0,
			// so there is always at least one slot.
			slots: slots.max(1),
		})
	}

	/// Matches `input` anchored at offset 0, reporting every group.
	pub fn find(&self, input: &[u8], options: &MatchOptions) -> MatchResult {
		MatchContext::new(self, input, options).run()
	}

	pub fn is_match(&self, input: &[u8]) -> bool {
		self.find(input, &MatchOptions::new().with_max_groups(0)).is_match()
	}

	pub fn root(&self) -> NfaIdx {
		self.root
	}

	pub fn groups(&self) -> usize {
		self.groups
	}

	/// Width of one offsets record.
	pub fn offsets_len(&self) -> usize {
		2 * self.groups
	}

	pub fn slots(&self) -> usize {
		self.slots
	}

	pub fn states(&self) -> &[NfaState] {
		&self.states
	}

	pub fn len(&self) -> usize {
		self.states.len()
	}
}

impl NfaState {
	pub fn range(ranges: ByteRanges, out: NfaIdx) -> Self {
		Self::Range { ranges, out, slot: 0 }
	}

	pub fn successors(&self) -> impl Iterator<Item = NfaIdx> {
		let (first, second): (Option<NfaIdx>, Option<NfaIdx>) = match *self {
			Self::Split { primary, secondary } => (Some(primary), Some(secondary)),
			Self::Pass { out } | Self::Tag { out, .. } | Self::Range { out, .. } => (Some(out), None),
			Self::Accept => (None, None),
		};
		first.into_iter().chain(second)
	}

	pub fn is_accept(&self) -> bool {
		matches!(self, Self::Accept)
	}
}

impl TagInfo {
	pub fn start(group: usize) -> Self {
		assert!(group > 0, "group 0 is the implicit whole match and has no tags");
		Self {
			idx: (2 * (group - 1)) as u32,
			negated: false,
		}
	}

	pub fn end(group: usize) -> Self {
		assert!(group > 0, "group 0 is the implicit whole match and has no tags");
		Self {
			idx: (2 * (group - 1) + 1) as u32,
			negated: false,
		}
	}

	/// The same boundary, but recording "unset".
	pub fn negate(self) -> Self {
		Self {
			idx: self.idx,
			negated: true,
		}
	}
}

impl std::ops::Index<NfaIdx> for Nfa {
	type Output = NfaState;

	fn index(&self, i: NfaIdx) -> &Self::Output {
		&self.states[i.0]
	}
}

impl std::fmt::Display for NfaError {
	fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::NoStates => fmt.write_str("automaton has no states"),
			Self::RootOutOfBounds { root, states } => {
				fmt.write_fmt(format_args!("root {} is out of bounds ({states} states)", root.0))
			},
			Self::EdgeOutOfBounds { from, to, states } => fmt.write_fmt(format_args!(
				"state {} has an edge to {}, out of bounds ({states} states)",
				from.0, to.0
			)),
			Self::TagOutOfBounds { state, tag, groups } => fmt.write_fmt(format_args!(
				"state {} uses tag {tag}, but {groups} groups only have {} tags",
				state.0,
				2 * groups
			)),
			Self::EmptyRange { state } => fmt.write_fmt(format_args!("state {} matches no byte", state.0)),
			Self::TooManyGroups { groups } => {
				fmt.write_fmt(format_args!("{groups} groups exceed the limit of {MAX_GROUPS}"))
			},
		}
	}
}

impl std::error::Error for NfaError {}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ranges::ByteRange;

	fn byte(b: u8, out: usize) -> NfaState {
		NfaState::range(ByteRanges::from(ByteRange::single(b)), NfaIdx(out))
	}

	#[test]
	fn assigns_slots_to_ranges_in_order() {
		let nfa: Nfa = Nfa::new(
			vec![
				NfaState::Split {
					primary: NfaIdx(1),
					secondary: NfaIdx(2),
				},
				byte(b'a', 3),
				byte(b'b', 3),
				NfaState::Accept,
			],
			NfaIdx(0),
			0,
		)
		.unwrap();
		assert_eq!(nfa.slots(), 2);
		let slots: Vec<usize> = nfa
			.states()
			.iter()
			.filter_map(|state| match state {
				NfaState::Range { slot, .. } => Some(*slot),
				_ => None,
			})
			.collect::<Vec<_>>();
		assert_eq!(slots, vec![0, 1]);
	}

	#[test]
	fn at_least_one_slot() {
		let nfa: Nfa = Nfa::new(vec![NfaState::Accept], NfaIdx(0), 0).unwrap();
		assert_eq!(nfa.slots(), 1);
		assert_eq!(nfa.offsets_len(), 0);
	}

	#[test]
	fn rejects_malformed() {
		assert_eq!(Nfa::new(Vec::new(), NfaIdx(0), 0).unwrap_err(), NfaError::NoStates);
		assert_eq!(
			Nfa::new(vec![NfaState::Accept], NfaIdx(1), 0).unwrap_err(),
			NfaError::RootOutOfBounds {
				root: NfaIdx(1),
				states: 1,
			}
		);
		assert_eq!(
			Nfa::new(vec![NfaState::Pass { out: NfaIdx(7) }], NfaIdx(0), 0).unwrap_err(),
			NfaError::EdgeOutOfBounds {
				from: NfaIdx(0),
				to: NfaIdx(7),
				states: 1,
			}
		);
		assert_eq!(
			Nfa::new(
				vec![
					NfaState::Tag {
						info: TagInfo::end(1),
						out: NfaIdx(1),
					},
					NfaState::Accept,
				],
				NfaIdx(0),
				0,
			)
			.unwrap_err(),
			NfaError::TagOutOfBounds {
				state: NfaIdx(0),
				tag: 1,
				groups: 0,
			}
		);
		assert_eq!(
			Nfa::new(
				vec![NfaState::range(ByteRanges::new(), NfaIdx(1)), NfaState::Accept],
				NfaIdx(0),
				0
			)
			.unwrap_err(),
			NfaError::EmptyRange { state: NfaIdx(0) }
		);
		assert_eq!(
			Nfa::new(vec![NfaState::Accept], NfaIdx(0), MAX_GROUPS + 1).unwrap_err(),
			NfaError::TooManyGroups { groups: MAX_GROUPS + 1 }
		);
		assert_eq!(
			Nfa::new(vec![NfaState::Accept], NfaIdx(0), usize::MAX).unwrap_err(),
			NfaError::TooManyGroups { groups: usize::MAX }
		);
	}

	#[test]
	fn tag_info_layout() {
		assert_eq!(TagInfo::start(1).idx, 0);
		assert_eq!(TagInfo::end(1).idx, 1);
		assert_eq!(TagInfo::start(3).idx, 4);
		assert_eq!(TagInfo::end(3).idx, 5);
		assert!(TagInfo::end(2).negate().negated);
		assert_eq!(TagInfo::end(2).negate().idx, 3);
	}

	#[test]
	fn successors_in_priority_order() {
		let split: NfaState = NfaState::Split {
			primary: NfaIdx(4),
			secondary: NfaIdx(2),
		};
		assert_eq!(split.successors().collect::<Vec<_>>(), vec![NfaIdx(4), NfaIdx(2)]);
		assert_eq!(NfaState::Accept.successors().count(), 0);
		assert_eq!(byte(b'x', 9).successors().collect::<Vec<_>>(), vec![NfaIdx(9)]);
	}
}
