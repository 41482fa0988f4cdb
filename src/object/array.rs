use ::std::cell::RefCell;
use ::std::fmt::Debug;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::rc::Rc;

use super::Value;
use crate::fmt::write_array;

/// A sequence with shared-reference semantics, the positional
/// counterpart of [`Map`](crate::Map). Cloning aliases the same
/// storage; identity is the storage address.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Display for Array {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write_array(f, self, &mut Vec::new())
    }
}

impl Debug for Array {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

/// Arrays compare by identity, not by content, for the same reason
/// maps do.
impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Returns a copy of the item at the index. Container items come
    /// out as aliasing handles.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Replaces the item at the index. Returns false without storing
    /// anything when the index is out of bounds.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> bool {
        let mut items = self.0.borrow_mut();
        if let Some(slot) = items.get_mut(index) {
            *slot = value.into();
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the current items. Later mutations of the array do
    /// not affect an already-taken snapshot.
    pub fn items(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    /// Drops every item. Severs any reference cycle running through
    /// this array.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// The storage address, shared by all aliasing handles.
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

    impl<V: Into<Value>> FromIterator<V> for Array {
        fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Array {
            Self(Rc::new(RefCell::new(
                iter.into_iter().map(Into::into).collect(),
            )))
        }
    }
}
