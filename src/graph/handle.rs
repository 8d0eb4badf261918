//! Shared entity handles
//!
//! Entities are reference-counted and interior-mutable so a node and the
//! edges in its adjacency can point at each other. Handles compare by
//! virtual id, not by pointer.

use super::types::VirtualId;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

pub(crate) struct Shared<T> {
    virtual_id: VirtualId,
    inner: Arc<RwLock<T>>,
}

impl<T> Shared<T> {
    pub(crate) fn new(virtual_id: VirtualId, value: T) -> Self {
        Shared {
            virtual_id,
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub(crate) fn virtual_id(&self) -> VirtualId {
        self.virtual_id
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    pub(crate) fn downgrade(&self) -> WeakShared<T> {
        WeakShared {
            virtual_id: self.virtual_id,
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared {
            virtual_id: self.virtual_id,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        self.virtual_id == other.virtual_id
    }
}

impl<T> Eq for Shared<T> {}

impl<T> Hash for Shared<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.virtual_id.hash(state);
    }
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared({})", self.virtual_id.as_i64())
    }
}

/// Non-owning handle; remembers the virtual id after the target is gone
pub(crate) struct WeakShared<T> {
    virtual_id: VirtualId,
    inner: Weak<RwLock<T>>,
}

impl<T> WeakShared<T> {
    pub(crate) fn virtual_id(&self) -> VirtualId {
        self.virtual_id
    }

    pub(crate) fn upgrade(&self) -> Option<Shared<T>> {
        self.inner.upgrade().map(|inner| Shared {
            virtual_id: self.virtual_id,
            inner,
        })
    }
}

impl<T> Clone for WeakShared<T> {
    fn clone(&self) -> Self {
        WeakShared {
            virtual_id: self.virtual_id,
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for WeakShared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakShared({})", self.virtual_id.as_i64())
    }
}
