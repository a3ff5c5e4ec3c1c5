/// Knobs for one match attempt.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MatchOptions {
	/// Upper bound on reported groups; the whole match is always reported.
	pub max_groups: usize,
	/// Treat the first zero byte as the end of input, like a C string.
	///
	/// Scanning always stops at the end of the slice regardless.
	/// Turning this off lets embedded zero bytes be matched.
	pub stop_at_nul: bool,
}

impl MatchOptions {
	pub const fn new() -> Self {
		Self {
			max_groups: usize::MAX,
			stop_at_nul: true,
		}
	}

	pub const fn with_max_groups(mut self, max_groups: usize) -> Self {
		self.max_groups = max_groups;
		self
	}

	pub const fn with_stop_at_nul(mut self, stop_at_nul: bool) -> Self {
		self.stop_at_nul = stop_at_nul;
		self
	}

	/// Whether the scan ends before consuming `byte`.
	pub(crate) fn is_terminator(&self, byte: u8) -> bool {
		self.stop_at_nul && (byte == 0)
	}
}

impl Default for MatchOptions {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn defaults() {
		let options: MatchOptions = MatchOptions::default();
		assert_eq!(options.max_groups, usize::MAX);
		assert!(options.stop_at_nul);
		assert!(options.is_terminator(0));
		assert!(!options.is_terminator(b'a'));
	}

	#[test]
	fn length_bounded() {
		let options: MatchOptions = MatchOptions::new().with_stop_at_nul(false).with_max_groups(3);
		assert_eq!(options.max_groups, 3);
		assert!(!options.is_terminator(0));
	}
}
