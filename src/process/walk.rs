use ::log::trace;
use ::std::collections::HashSet;
use ::std::collections::VecDeque;

use crate::object::Value;

/// Deep traversal over a value graph. Containers are tracked by
/// identity and visited at most once, so shared subtrees are not
/// revisited and reference cycles terminate. Primitives carry no
/// identity and are visited per occurrence.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Traverse {
    depth_first: bool,
}

impl Traverse {
    /// Level order: a node is visited before any of its descendants.
    pub(crate) fn breadth_first() -> Self {
        Self { depth_first: false }
    }

    /// Post order: all of a node's descendants are visited before the
    /// node itself.
    pub(crate) fn depth_first() -> Self {
        Self { depth_first: true }
    }

    /// Visits the root and every value reachable from it. A container's
    /// children are snapshot before the visitor runs on it, so a
    /// visitor mutating the container does not change what this walk
    /// visits under it.
    pub(crate) fn for_each(&self, root: &Value, mut visit: impl FnMut(&Value)) {
        let mut seen = HashSet::new();
        if self.depth_first {
            post_order(root, &mut seen, &mut visit);
        } else {
            level_order(root, &mut seen, &mut visit);
        }
    }
}

fn level_order(root: &Value, seen: &mut HashSet<usize>, visit: &mut impl FnMut(&Value)) {
    let mut queue = VecDeque::new();
    queue.push_back(root.clone());
    while let Some(value) = queue.pop_front() {
        if let Some(addr) = container_addr(&value) {
            if !seen.insert(addr) {
                trace!("Traverse: already visited container at {:#x}", addr);
                continue;
            }
        }
        let children = children_of(&value);
        visit(&value);
        queue.extend(children);
    }
}

fn post_order(value: &Value, seen: &mut HashSet<usize>, visit: &mut impl FnMut(&Value)) {
    if let Some(addr) = container_addr(value) {
        if !seen.insert(addr) {
            trace!("Traverse: already visited container at {:#x}", addr);
            return;
        }
    }
    for child in children_of(value) {
        post_order(&child, seen, visit);
    }
    visit(value);
}

fn container_addr(value: &Value) -> Option<usize> {
    match value {
        Value::Array(array) => Some(array.addr()),
        Value::Map(map) => Some(map.addr()),
        _ => None,
    }
}

fn children_of(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(array) => array.items(),
        Value::Map(map) => map
            .entries()
            .into_iter()
            .map(|(_, entry_value)| entry_value)
            .collect(),
        _ => Vec::new(),
    }
}
