use crate::captures::Captures;
use crate::captures::MatchResult;
use crate::captures::UNSET;
use crate::history::HistoryIdx;
use crate::history::TagHistory;
use crate::nfa::Nfa;
use crate::nfa::NfaIdx;
use crate::nfa::NfaState;
use crate::options::MatchOptions;

/// One simulation thread: where it is, which slot its offsets came from, and its tags since then.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Configuration {
	pub state: NfaIdx,
	/// Thread slot holding this thread's offsets as of the previous step.
	pub origin: usize,
	pub history: HistoryIdx,
}

/// Per-match "visited during this closure" marks.
///
/// A state is visited iff its mark equals the current generation,
/// so starting a new closure forgets every mark at once.
#[derive(Debug)]
struct Visited {
	seen: Vec<u32>,
	generation: u32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct Accepted {
	/// Bytes consumed when the accepting thread was found.
	end: usize,
	history: HistoryIdx,
}

/// Everything one match attempt mutates.
///
/// - <https://re2c.org/2022_borsotti_trofimovich_a_closer_look_at_tdfa.pdf>
/// - <https://arxiv.org/abs/2206.01398>
///
/// Leftmost-first simulation with lazily reconstructed offsets:
/// tag histories only span one step, and are folded into per-slot
/// offset records whenever a thread consumes a byte or accepts.
#[derive(Debug)]
pub struct MatchContext<'nfa, 'input> {
	nfa: &'nfa Nfa,
	input: &'input [u8],
	options: MatchOptions,
	/// Bytes consumed so far.
	step: usize,
	/// Closed configuration set at the current position, highest priority first.
	threads: Vec<Configuration>,
	/// Seeds of the next closure, popped from the back.
	worklist: Vec<Configuration>,
	visited: Visited,
	history: TagHistory,
	/// `slots × offsets_len` records written while consuming the current byte.
	current: Vec<isize>,
	/// Records written on the previous step, indexed by [`Configuration::origin`].
	previous: Vec<isize>,
	/// Record of the most recent accepting thread.
	finalized: Vec<isize>,
	done: Vec<bool>,
	accepted: Option<Accepted>,
}

impl<'nfa, 'input> MatchContext<'nfa, 'input> {
	pub fn new(nfa: &'nfa Nfa, input: &'input [u8], options: &MatchOptions) -> Self {
		let width: usize = nfa.offsets_len();
		Self {
			nfa,
			input,
			options: *options,
			step: 0,
			threads: Vec::new(),
			worklist: Vec::new(),
			visited: Visited::new(nfa.len()),
			history: TagHistory::new(),
			current: vec![UNSET; nfa.slots() * width],
			previous: vec![UNSET; nfa.slots() * width],
			finalized: vec![UNSET; width],
			done: vec![false; width],
			accepted: None,
		}
	}

	pub fn run(mut self) -> MatchResult {
		debug!("matching {} input bytes, {} states", self.input.len(), self.nfa.len());

		self.worklist.push(Configuration {
			state: self.nfa.root(),
			origin: 0,
			history: HistoryIdx::ROOT,
		});
		self.closure();

		while !self.threads.is_empty() {
			let Some(&byte): Option<&u8> = self.input.get(self.step) else {
				break;
			};
			if self.options.is_terminator(byte) {
				debug!("terminator at {}", self.step);
				break;
			}
			self.reach_on_symbol(byte);
			self.step += 1;
			self.closure();
		}

		self.finish()
	}

	/// Expands `worklist` through silent transitions into `threads`.
	///
	/// Depth first, `Split` primaries before secondaries, so `threads` ends up in priority order.
	fn closure(&mut self) {
		let nfa: &'nfa Nfa = self.nfa;

		self.threads.clear();
		self.visited.next_generation();

		while let Some(mut conf) = self.worklist.pop() {
			if !self.visited.insert(conf.state) {
				continue;
			}
			self.threads.push(conf);

			match &nfa[conf.state] {
				NfaState::Pass { out } => {
					conf.state = *out;
					self.worklist.push(conf);
				},
				NfaState::Split { primary, secondary } => {
					// Stack order: the primary edge is popped first.
					self.worklist.push(Configuration {
						state: *secondary,
						..conf
					});
					self.worklist.push(Configuration {
						state: *primary,
						..conf
					});
				},
				NfaState::Tag { info, out } => {
					conf.history = self.history.push(conf.history, *info);
					conf.state = *out;
					self.worklist.push(conf);
				},
				NfaState::Range { .. } => (),
				NfaState::Accept => {
					debug!("accepted after {} bytes", self.step);
					self.accepted = Some(Accepted {
						end: self.step,
						history: conf.history,
					});
					// Whatever is still queued has lower priority than this thread.
					self.worklist.clear();
				},
			}
		}

		trace!("closure at {}: {:?}", self.step, self.threads);
	}

	/// Moves every thread that can consume `byte` into `worklist`,
	/// first saving its offsets into the slot of the state it leaves.
	fn reach_on_symbol(&mut self, byte: u8) {
		assert!(self.worklist.is_empty(), "worklist must be drained by the previous closure");
		let nfa: &'nfa Nfa = self.nfa;

		trace!("step {}, byte {byte:#04x}", self.step);

		let threads: Vec<Configuration> = std::mem::take(&mut self.threads);
		// In reverse, so the next closure pops the seeds in priority order.
		for conf in threads.iter().rev() {
			debug_assert!(self.visited.contains(conf.state));
			match &nfa[conf.state] {
				NfaState::Range { ranges, out, slot } => {
					if ranges.matches(byte) {
						self.worklist.push(Configuration {
							state: *out,
							origin: *slot,
							history: HistoryIdx::ROOT,
						});
						self.update_offsets(conf);
					}
				},
				NfaState::Accept => {
					self.update_offsets(conf);
				},
				NfaState::Split { .. } | NfaState::Pass { .. } | NfaState::Tag { .. } => (),
			}
		}
		// Hand the allocation back; the next closure clears it.
		self.threads = threads;

		std::mem::swap(&mut self.current, &mut self.previous);
		// Every seed starts from the root history, so no chain is reachable anymore.
		self.history.clear();
	}

	/// Writes the full offsets record of `conf` at the current step:
	/// the record of its origin slot, overlaid with its tag history.
	fn update_offsets(&mut self, conf: &Configuration) {
		let nfa: &'nfa Nfa = self.nfa;
		let width: usize = nfa.offsets_len();

		let record: &mut [isize] = match &nfa[conf.state] {
			NfaState::Accept => &mut self.finalized[..],
			NfaState::Range { slot, .. } => &mut self.current[(*slot * width)..((*slot + 1) * width)],
			other => unreachable!("only consuming or accepting threads own offsets, not {other:?}"),
		};

		record.copy_from_slice(&self.previous[(conf.origin * width)..((conf.origin + 1) * width)]);
		self.done.fill(false);

		// Most recent first: the latest assignment of a tag shadows older ones.
		for info in self.history.chain(conf.history) {
			let t: usize = info.idx as usize;
			if !self.done[t] {
				self.done[t] = true;
				record[t] = if info.negated { UNSET } else { self.step as isize };
			}
		}
	}

	fn finish(mut self) -> MatchResult {
		let threads: Vec<Configuration> = std::mem::take(&mut self.threads);
		for conf in threads.iter() {
			if self.nfa[conf.state].is_accept() {
				debug_assert_eq!(self.accepted.map(|accepted| accepted.history), Some(conf.history));
				self.update_offsets(conf);
			}
		}

		let Some(accepted): Option<Accepted> = self.accepted else {
			debug!("no match after {} bytes", self.step);
			return MatchResult::NoMatch;
		};

		let groups: usize = self.options.max_groups.min(self.nfa.groups());
		debug!("match 0..{}, reporting {groups} groups", accepted.end);
		MatchResult::Matched(Captures::from_offsets(accepted.end, &self.finalized[..(2 * groups)]))
	}
}

impl Visited {
	fn new(states: usize) -> Self {
		Self {
			seen: vec![0; states],
			generation: 0,
		}
	}

	fn next_generation(&mut self) {
		if self.generation == u32::MAX {
			self.seen.fill(0);
			self.generation = 0;
		}
		self.generation += 1;
	}

	/// Returns `false` if `state` was already visited in this generation.
	fn insert(&mut self, state: NfaIdx) -> bool {
		let mark: &mut u32 = &mut self.seen[state.0];
		if *mark == self.generation {
			false
		} else {
			*mark = self.generation;
			true
		}
	}

	fn contains(&self, state: NfaIdx) -> bool {
		self.seen[state.0] == self.generation
	}
}
