use ::std::cell::RefCell;
use ::std::collections::HashMap;
use ::std::fmt::Debug;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::rc::Rc;

use super::Value;
use crate::fmt::write_map;

/// A plain string-keyed data object with shared-reference semantics.
/// Cloning a `Map` aliases the same storage rather than copying it, so
/// several values can point at one object and mutations through any
/// handle are visible through all of them. Reference cycles are
/// representable; [`Map::clear`] breaks them when the graph should be
/// reclaimed.
#[derive(Clone, Default)]
pub struct Map(Rc<RefCell<HashMap<String, Value>>>);

impl Display for Map {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write_map(f, self, &mut Vec::new())
    }
}

impl Debug for Map {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

/// Maps compare by identity, not by content. Two maps built from the
/// same entries are distinct objects and compare unequal; a handle and
/// its clone compare equal. Content comparison does not terminate on
/// cyclic graphs, identity comparison always does.
impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the entry, returning the value previously stored under
    /// the key.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Returns a copy of the value stored under the key. Container
    /// values come out as aliasing handles, so mutating them mutates
    /// the stored object.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the current key set, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of the current entries, in no particular order. Later
    /// mutations of the map do not affect an already-taken snapshot.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Drops every entry. Severs any reference cycle running through
    /// this map so the involved allocations can be reclaimed.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// The storage address, stable for the lifetime of the object and
    /// shared by all aliasing handles. Serves as an identity token.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Whether both handles alias the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

mod convert {
    use super::*;

    impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Map {
        fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Map {
            Self(Rc::new(RefCell::new(
                iter.into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            )))
        }
    }
}
