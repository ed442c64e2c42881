// SPDX-License-Identifier: Apache-2.0

//! Shortest-path search over the conversion graph.
//!
//! Nodes are kinds; an edge exists wherever a direct converter is
//! registered, reachable either on the node itself, on a capability the
//! node implements, or (for sequence kinds) element-wise on the inner
//! kinds. Paths are found breadth-first, so the first hit is minimal, and
//! memoized until the registry changes.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use itertools::Itertools;
use log::debug;
use once_cell::sync::Lazy;
use crate::Kind;
use crate::registry::Registry;

struct Cache {
	version: u64,
	paths: HashMap<(Kind, Kind), Option<Vec<Kind>>>,
}

static CACHE: Lazy<Mutex<Cache>> = Lazy::new(|| {
	Mutex::new(Cache { version: 0, paths: HashMap::new() })
});

/// Resolves the node path from `src` to `dst`, or `None` when the graph has
/// no route. An assignable pair resolves to the singleton identity path.
pub(crate) fn plan(registry: &Registry, src: &Kind, dst: &Kind) -> Option<Vec<Kind>> {
	if registry.assignable(src, dst) {
		return Some(vec![src.clone()]);
	}
	let key = (src.clone(), dst.clone());
	{
		let mut cache = CACHE.lock().unwrap_or_else(PoisonError::into_inner);
		if cache.version == registry.version() {
			if let Some(hit) = cache.paths.get(&key) {
				return hit.clone();
			}
		} else {
			cache.paths.clear();
			cache.version = registry.version();
		}
	}
	let path = search(registry, src, dst);
	match &path {
		Some(found) => debug!("resolved {src} -> {dst} via {}", found.iter().join(", ")),
		None => debug!("no conversion path {src} -> {dst}"),
	}
	CACHE
		.lock()
		.unwrap_or_else(PoisonError::into_inner)
		.paths
		.insert(key, path.clone());
	path
}

/// The globally shortest path across every effective destination of `dst`;
/// ties go to the destination enumerated first.
fn search(registry: &Registry, src: &Kind, dst: &Kind) -> Option<Vec<Kind>> {
	let mut best: Option<Vec<Kind>> = None;
	for goal in registry.valid_destinations(dst) {
		if let Some(path) = breadth_first(registry, src, &goal) {
			if best.as_ref().map_or(true, |b| path.len() < b.len()) {
				best = Some(path);
			}
		}
	}
	best
}

fn breadth_first(registry: &Registry, start: &Kind, goal: &Kind) -> Option<Vec<Kind>> {
	if start == goal {
		return Some(vec![start.clone()]);
	}
	let mut frontier = VecDeque::from([start.clone()]);
	let mut visited = HashSet::from([start.clone()]);
	let mut came_from: HashMap<Kind, Kind> = HashMap::new();
	while let Some(node) = frontier.pop_front() {
		for next in neighbors(registry, &node) {
			if !visited.insert(next.clone()) {
				continue;
			}
			came_from.insert(next.clone(), node.clone());
			if &next == goal {
				return Some(reconstruct(&came_from, start, goal));
			}
			frontier.push_back(next);
		}
	}
	None
}

/// Every kind one registered conversion away from `node`.
pub(crate) fn neighbors(registry: &Registry, node: &Kind) -> Vec<Kind> {
	let mut out = Vec::new();
	for source in registry.effective_sources(node) {
		out.extend(registry.destinations_from(&source).cloned());
	}
	if let Kind::Many(inner) = node {
		// Element-wise lifting: an inner conversion becomes a lazy
		// sequence-to-sequence edge. Sequence-valued inner edges are
		// skipped, sequences do not nest.
		for source in registry.effective_sources(inner) {
			out.extend(
				registry
					.destinations_from(&source)
					.filter(|to| !to.is_many())
					.cloned()
					.map(Kind::many),
			);
		}
	}
	out.into_iter().unique().collect()
}

fn reconstruct(came_from: &HashMap<Kind, Kind>, start: &Kind, goal: &Kind) -> Vec<Kind> {
	let mut path = vec![goal.clone()];
	let mut node = goal;
	while node != start {
		node = &came_from[node];
		path.push(node.clone());
	}
	path.reverse();
	path
}

/// Every kind reachable from `start`, in discovery order, `start` first.
pub(crate) fn reachable(registry: &Registry, start: &Kind) -> Vec<Kind> {
	let mut order = vec![start.clone()];
	let mut visited = HashSet::from([start.clone()]);
	let mut frontier = VecDeque::from([start.clone()]);
	while let Some(node) = frontier.pop_front() {
		for next in neighbors(registry, &node) {
			if visited.insert(next.clone()) {
				order.push(next.clone());
				frontier.push_back(next);
			}
		}
	}
	order
}
