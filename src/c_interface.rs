use std::ffi::CStr;
use std::ffi::c_char;
use std::ffi::c_int;
use std::marker::PhantomData;
use std::str::Utf8Error;

use crate::captures::MatchResult;
use crate::captures::Span;
use crate::captures::UNSET;
use crate::nfa::Nfa;
use crate::options::MatchOptions;

/// Returned by [`tnfa_regexec`] when the input does not match.
pub const TNFA_NOMATCH: c_int = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSlice<'lifetime, T> {
	pointer: *const T,
	length: usize,
	_lifetime: PhantomData<&'lifetime [T]>,
}

pub type CStringView<'lifetime> = CSlice<'lifetime, c_char>;

/// One reported span, laid out like POSIX `regmatch_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RegMatch {
	pub rm_so: isize,
	pub rm_eo: isize,
}

/// Returns null if `text` is not UTF-8 or does not describe a valid automaton.
#[unsafe(no_mangle)]
unsafe extern "C" fn tnfa_nfa_from_text(text: CStringView<'_>) -> Option<Box<Nfa>> {
	let text: &str = match text.as_utf8() {
		Ok(text) => text,
		Err(err) => {
			debug!("automaton text is not utf-8: {err}");
			return None;
		},
	};
	match Nfa::from_text(text) {
		Ok(nfa) => Some(Box::new(nfa)),
		Err(err) => {
			debug!("rejected automaton text: {err}");
			None
		},
	}
}

#[unsafe(no_mangle)]
unsafe extern "C" fn tnfa_nfa_delete(nfa: Box<Nfa>) {
	std::mem::drop(nfa);
}

#[unsafe(no_mangle)]
extern "C" fn tnfa_nfa_groups(nfa: &Nfa) -> usize {
	nfa.groups()
}

/// Matches the NUL-terminated `string` against `nfa`.
///
/// Writes the whole match to `pmatch[0]` and group `i` to `pmatch[i]`, for `i < nmatch`;
/// entries past the automaton's groups get `-1`. `pmatch` is left alone on no match.
///
/// # Safety
///
/// `string` must be NUL-terminated, and `pmatch` must point to `nmatch` writable entries
/// (it may be null when `nmatch` is 0).
#[unsafe(no_mangle)]
unsafe extern "C" fn tnfa_regexec(nfa: &Nfa, string: *const c_char, nmatch: usize, pmatch: *mut RegMatch) -> c_int {
	let input: &[u8] = unsafe { CStr::from_ptr(string) }.to_bytes();
	let options: MatchOptions = MatchOptions::new().with_max_groups(nmatch.saturating_sub(1));

	let MatchResult::Matched(captures) = nfa.find(input, &options) else {
		return TNFA_NOMATCH;
	};

	if nmatch == 0 {
		return 0;
	}

	let pmatch: &mut [RegMatch] = unsafe { std::slice::from_raw_parts_mut(pmatch, nmatch) };
	for (i, entry) in pmatch.iter_mut().enumerate() {
		let span: Span = captures.get(i).unwrap_or(Span::UNSET);
		*entry = RegMatch::from(span);
	}

	0
}

impl From<Span> for RegMatch {
	fn from(span: Span) -> Self {
		Self {
			rm_so: span.start,
			rm_eo: span.end,
		}
	}
}

impl RegMatch {
	pub const UNSET: Self = Self {
		rm_so: UNSET,
		rm_eo: UNSET,
	};
}

impl<'lifetime> CStringView<'lifetime> {
	pub fn from_utf8(utf8: &'lifetime str) -> Self {
		Self {
			pointer: utf8.as_bytes().as_ptr().cast::<c_char>(),
			length: utf8.len(),
			_lifetime: PhantomData,
		}
	}

	pub fn as_utf8(&self) -> Result<&'lifetime str, Utf8Error> {
		let bytes: &[u8] = unsafe { std::slice::from_raw_parts(self.pointer.cast::<u8>(), self.length) };
		str::from_utf8(bytes)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	const A_THEN_BS: &str = "groups 2
		0: tag 0 -> 1
		1: range 'a' -> 2
		2: tag 1 -> 3
		3: tag 2 -> 4
		4: split 5 6
		5: range 'b' -> 4
		6: tag 3 -> 7
		7: accept";

	fn load(text: &str) -> Box<Nfa> {
		unsafe { tnfa_nfa_from_text(CStringView::from_utf8(text)) }.unwrap()
	}

	#[test]
	fn regexec() {
		let nfa: Box<Nfa> = load(A_THEN_BS);
		assert_eq!(tnfa_nfa_groups(&nfa), 2);

		let mut pmatch: [RegMatch; 4] = [RegMatch { rm_so: 7, rm_eo: 7 }; 4];
		let status: c_int = unsafe { tnfa_regexec(&nfa, c"abbc".as_ptr(), pmatch.len(), pmatch.as_mut_ptr()) };
		assert_eq!(status, 0);
		assert_eq!(
			pmatch,
			[
				RegMatch { rm_so: 0, rm_eo: 3 },
				RegMatch { rm_so: 0, rm_eo: 1 },
				RegMatch { rm_so: 1, rm_eo: 3 },
				RegMatch::UNSET,
			]
		);

		unsafe { tnfa_nfa_delete(nfa) };
	}

	#[test]
	fn fewer_slots_than_groups() {
		let nfa: Box<Nfa> = load(A_THEN_BS);

		let mut pmatch: [RegMatch; 2] = [RegMatch::UNSET; 2];
		let status: c_int = unsafe { tnfa_regexec(&nfa, c"ab".as_ptr(), pmatch.len(), pmatch.as_mut_ptr()) };
		assert_eq!(status, 0);
		assert_eq!(
			pmatch,
			[RegMatch { rm_so: 0, rm_eo: 2 }, RegMatch { rm_so: 0, rm_eo: 1 }]
		);

		let status: c_int = unsafe { tnfa_regexec(&nfa, c"a".as_ptr(), 0, std::ptr::null_mut()) };
		assert_eq!(status, 0);
	}

	#[test]
	fn no_match_leaves_pmatch_alone() {
		let nfa: Box<Nfa> = load(A_THEN_BS);

		let mut pmatch: [RegMatch; 1] = [RegMatch { rm_so: 5, rm_eo: 6 }];
		let status: c_int = unsafe { tnfa_regexec(&nfa, c"b".as_ptr(), pmatch.len(), pmatch.as_mut_ptr()) };
		assert_eq!(status, TNFA_NOMATCH);
		assert_eq!(pmatch, [RegMatch { rm_so: 5, rm_eo: 6 }]);
	}

	#[test]
	fn rejects_bad_text() {
		assert!(unsafe { tnfa_nfa_from_text(CStringView::from_utf8("0: jump")) }.is_none());
		assert!(unsafe { tnfa_nfa_from_text(CStringView::from_utf8("0: pass -> 3")) }.is_none());
	}
}
