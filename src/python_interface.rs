use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use crate::captures::Captures;
use crate::captures::MatchResult;
use crate::captures::Span;
use crate::nfa::Nfa;
use crate::options::MatchOptions;

pyo3::create_exception!(tnfa, TnfaException, PyRuntimeError);
pyo3::create_exception!(tnfa, TnfaInvalidAutomaton, TnfaException);

type PySpan = (isize, isize);

#[pyclass(frozen)]
#[derive(Debug)]
struct Automaton {
	nfa: Nfa,
}

#[pymethods]
impl Automaton {
	#[new]
	fn new(text: &str) -> PyResult<Self> {
		let nfa: Nfa = Nfa::from_text(text)
			.map_err(|err| TnfaInvalidAutomaton::new_err(format!("Invalid automaton: {err}")))?;
		Ok(Self { nfa })
	}

	#[getter]
	fn groups(&self) -> usize {
		self.nfa.groups()
	}

	/// Returns `None`, or the whole match and the list of group spans (`(-1, -1)` if unset).
	#[pyo3(name = "match", signature = (input, max_groups = None, stop_at_nul = true))]
	fn find(
		&self,
		py: Python<'_>,
		input: &[u8],
		max_groups: Option<usize>,
		stop_at_nul: bool,
	) -> Option<(PySpan, Vec<PySpan>)> {
		let options: MatchOptions = MatchOptions::new()
			.with_max_groups(max_groups.unwrap_or(usize::MAX))
			.with_stop_at_nul(stop_at_nul);

		let result: MatchResult = py.detach(|| self.nfa.find(input, &options));
		let captures: Captures = result.into_captures()?;

		Some((
			as_tuple(captures.whole()),
			captures.groups().iter().copied().map(as_tuple).collect::<Vec<_>>(),
		))
	}

	fn __repr__(&self) -> String {
		format!(
			"Automaton(states={}, groups={})",
			self.nfa.len(),
			self.nfa.groups()
		)
	}
}

fn as_tuple(span: Span) -> PySpan {
	(span.start, span.end)
}

#[pymodule]
mod tnfa {
	#[pymodule_export]
	use super::Automaton;
	#[pymodule_export]
	use super::TnfaException;
	#[pymodule_export]
	use super::TnfaInvalidAutomaton;
}
