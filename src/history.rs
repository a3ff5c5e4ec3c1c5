use crate::nfa::TagInfo;

/// Arena of backward-linked tag assignments.
///
/// Every thread's history is the chain reached by following `predecessor`
/// from its head back to [`HistoryIdx::ROOT`]. Threads forked by a split
/// share the prefix recorded before the fork, so the arena is a DAG of chains.
/// Nodes are never mutated; the whole arena is dropped at once with [`TagHistory::clear`].
#[derive(Debug, Default)]
pub struct TagHistory {
	nodes: Vec<HistoryNode>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct HistoryNode {
	pub predecessor: HistoryIdx,
	pub info: TagInfo,
}

#[derive(Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HistoryIdx(u32);

/// Walks a chain from the most recent assignment to the oldest.
pub struct Chain<'history> {
	history: &'history TagHistory,
	current: HistoryIdx,
}

impl HistoryIdx {
	/// The empty history.
	pub const ROOT: Self = Self(u32::MAX);

	pub fn is_root(&self) -> bool {
		*self == Self::ROOT
	}
}

impl TagHistory {
	pub const fn new() -> Self {
		Self { nodes: Vec::new() }
	}

	/// Appends `info` on top of the chain `predecessor`, returning the new head.
	pub fn push(&mut self, predecessor: HistoryIdx, info: TagInfo) -> HistoryIdx {
		assert!(
			self.nodes.len() < HistoryIdx::ROOT.0 as usize,
			"tag history is full"
		);
		let idx: u32 = self.nodes.len() as u32;
		self.nodes.push(HistoryNode { predecessor, info });
		HistoryIdx(idx)
	}

	pub fn chain(&self, head: HistoryIdx) -> Chain<'_> {
		Chain {
			history: self,
			current: head,
		}
	}

	pub fn clear(&mut self) {
		self.nodes.clear();
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

impl std::ops::Index<HistoryIdx> for TagHistory {
	type Output = HistoryNode;

	fn index(&self, i: HistoryIdx) -> &Self::Output {
		&self.nodes[i.0 as usize]
	}
}

impl Iterator for Chain<'_> {
	type Item = TagInfo;

	fn next(&mut self) -> Option<Self::Item> {
		if self.current.is_root() {
			return None;
		}
		let node: &HistoryNode = &self.history[self.current];
		self.current = node.predecessor;
		Some(node.info)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn chains_share_prefixes() {
		let mut history: TagHistory = TagHistory::new();
		let open: HistoryIdx = history.push(HistoryIdx::ROOT, TagInfo::start(1));
		// Two threads fork after `open`.
		let left: HistoryIdx = history.push(open, TagInfo::end(1));
		let right: HistoryIdx = history.push(open, TagInfo::end(1).negate());
		assert_eq!(history.len(), 3);

		assert_eq!(
			history.chain(left).collect::<Vec<_>>(),
			vec![TagInfo::end(1), TagInfo::start(1)]
		);
		assert_eq!(
			history.chain(right).collect::<Vec<_>>(),
			vec![TagInfo::end(1).negate(), TagInfo::start(1)]
		);
		assert_eq!(history[left].predecessor, history[right].predecessor);
	}

	#[test]
	fn root_chain_is_empty() {
		let history: TagHistory = TagHistory::new();
		assert!(HistoryIdx::ROOT.is_root());
		assert_eq!(history.chain(HistoryIdx::ROOT).count(), 0);
	}

	#[test]
	fn clear_drops_everything() {
		let mut history: TagHistory = TagHistory::new();
		let head: HistoryIdx = history.push(HistoryIdx::ROOT, TagInfo::start(2));
		history.push(head, TagInfo::end(2));
		history.clear();
		assert!(history.is_empty());
		// Indices restart from zero.
		assert_eq!(history.push(HistoryIdx::ROOT, TagInfo::start(1)), head);
	}
}
