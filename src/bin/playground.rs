use std::process::ExitCode;

use tnfa_mechanic::captures::Captures;
use tnfa_mechanic::captures::MatchResult;
use tnfa_mechanic::nfa::Nfa;
use tnfa_mechanic::options::MatchOptions;

const USAGE: &str = "usage: playground [-v] <automaton-file> <input> [max-groups]";

fn main() -> ExitCode {
	let mut args: Vec<String> = std::env::args().skip(1).collect::<Vec<_>>();

	if let Some(pos) = args.iter().position(|arg| arg == "-v") {
		args.remove(pos);
		tracing_subscriber::fmt()
			.with_max_level(tracing::Level::TRACE)
			.with_file(true)
			.with_line_number(true)
			.with_writer(std::io::stderr)
			.init();
	}

	let (path, input, max_groups): (&str, &str, usize) = match args.as_slice() {
		[path, input] => (path.as_str(), input.as_str(), usize::MAX),
		[path, input, max_groups] => match max_groups.parse::<usize>() {
			Ok(max_groups) => (path.as_str(), input.as_str(), max_groups),
			Err(err) => {
				eprintln!("bad max-groups {max_groups:?}: {err}\n{USAGE}");
				return ExitCode::from(2);
			},
		},
		_ => {
			eprintln!("{USAGE}");
			return ExitCode::from(2);
		},
	};

	let text: String = match std::fs::read_to_string(path) {
		Ok(text) => text,
		Err(err) => {
			eprintln!("can't read {path:?}: {err}");
			return ExitCode::from(2);
		},
	};

	let nfa: Nfa = match Nfa::from_text(&text) {
		Ok(nfa) => nfa,
		Err(err) => {
			eprintln!("{path}: {err}");
			return ExitCode::from(2);
		},
	};

	let options: MatchOptions = MatchOptions::new().with_max_groups(max_groups);
	let captures: Captures = match nfa.find(input.as_bytes(), &options) {
		MatchResult::Matched(captures) => captures,
		MatchResult::NoMatch => {
			println!("no match");
			return ExitCode::from(1);
		},
	};

	println!("0: {}", captures.whole());
	for (i, span) in captures.groups().iter().enumerate() {
		println!("{}: {span}", i + 1);
	}

	ExitCode::SUCCESS
}
