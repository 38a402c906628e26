//! Pointer protection stack.
//!
//! Objects held only in native locals are invisible to the collector. Each
//! entry on this stack is a root. Guards returned by
//! [`ProtectionStack::protect`] remove their entry when dropped, so the usual
//! protect/unprotect pairing is structural. The raw [`push`] / [`unprotect`]
//! pair and watermark [`restore`] remain for callers whose roots outlive a
//! lexical scope (context records, on-exit expressions).
//!
//! [`push`]: ProtectionStack::push
//! [`unprotect`]: ProtectionStack::unprotect
//! [`restore`]: ProtectionStack::restore

use core_types::{RError, Sexp};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy)]
struct Entry {
    obj: Sexp,
    serial: u64,
}

#[derive(Debug)]
struct StackInner {
    entries: Vec<Entry>,
    limit: usize,
    next_serial: u64,
}

impl StackInner {
    fn push(&mut self, obj: Sexp) -> Result<(usize, u64), RError> {
        if self.entries.len() >= self.limit {
            return Err(RError::ProtectionStackOverflow(self.limit));
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        self.entries.push(Entry { obj, serial });
        Ok((self.entries.len() - 1, serial))
    }

    fn position_of(&self, index: usize, serial: u64) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let start = index.min(self.entries.len() - 1);
        (0..=start).rev().find(|&i| self.entries[i].serial == serial)
    }
}

/// Bounded stack of collector roots.
///
/// Cloning yields another handle to the same stack.
///
/// # Examples
///
/// ```
/// use core_types::Sexp;
/// use memory_manager::ProtectionStack;
///
/// let stack = ProtectionStack::new(16);
/// let x = Sexp::from_index(7);
/// {
///     let _guard = stack.protect(x).unwrap();
///     assert_eq!(stack.depth(), 1);
/// }
/// assert_eq!(stack.depth(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ProtectionStack {
    inner: Rc<RefCell<StackInner>>,
}

impl ProtectionStack {
    /// Creates an empty stack holding at most `limit` entries.
    pub fn new(limit: usize) -> Self {
        ProtectionStack {
            inner: Rc::new(RefCell::new(StackInner {
                entries: Vec::new(),
                limit,
                next_serial: 0,
            })),
        }
    }

    /// Protects `obj` until the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// [`RError::ProtectionStackOverflow`] when the stack is full.
    pub fn protect(&self, obj: Sexp) -> Result<Protected, RError> {
        let (index, serial) = self.inner.borrow_mut().push(obj)?;
        Ok(Protected {
            stack: self.clone(),
            obj,
            index,
            serial,
        })
    }

    /// Pushes `obj` without a guard and returns its position.
    ///
    /// The entry stays until [`unprotect`](Self::unprotect),
    /// [`unprotect_specific`](Self::unprotect_specific) or a
    /// [`restore`](Self::restore) below it removes it.
    pub fn push(&self, obj: Sexp) -> Result<usize, RError> {
        self.inner.borrow_mut().push(obj).map(|(index, _)| index)
    }

    /// Pops the top `n` entries.
    pub fn unprotect(&self, n: usize) -> Result<(), RError> {
        let mut inner = self.inner.borrow_mut();
        let len = inner.entries.len();
        if n > len {
            return Err(RError::invalid("unprotect(): stack imbalance"));
        }
        inner.entries.truncate(len - n);
        Ok(())
    }

    /// Removes the most recent entry for `obj`, shifting the entries above
    /// it down.
    pub fn unprotect_specific(&self, obj: Sexp) -> Result<(), RError> {
        let mut inner = self.inner.borrow_mut();
        match inner.entries.iter().rposition(|e| e.obj == obj) {
            Some(i) => {
                inner.entries.remove(i);
                Ok(())
            }
            None => Err(RError::invalid("unprotect_specific(): pointer not found")),
        }
    }

    /// Replaces the entry at `position`, as returned by [`push`](Self::push).
    pub fn reprotect(&self, position: usize, obj: Sexp) -> Result<(), RError> {
        let mut inner = self.inner.borrow_mut();
        match inner.entries.get_mut(position) {
            Some(entry) => {
                entry.obj = obj;
                Ok(())
            }
            None => Err(RError::invalid("reprotect(): position out of range")),
        }
    }

    /// Current number of entries; used as an unwind watermark.
    pub fn depth(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Maximum number of entries.
    pub fn limit(&self) -> usize {
        self.inner.borrow().limit
    }

    /// Truncates the stack back to `watermark`, dropping every entry pushed
    /// since. Guards whose entry is gone become no-ops.
    pub fn restore(&self, watermark: usize) {
        self.inner.borrow_mut().entries.truncate(watermark);
    }

    /// True when `obj` has at least one entry.
    pub fn contains(&self, obj: Sexp) -> bool {
        self.inner.borrow().entries.iter().any(|e| e.obj == obj)
    }

    /// Appends every protected object to `out`.
    pub fn extend_roots(&self, out: &mut Vec<Sexp>) {
        out.extend(self.inner.borrow().entries.iter().map(|e| e.obj));
    }
}

/// Scoped root created by [`ProtectionStack::protect`].
///
/// Dropping the guard removes exactly its own entry even when guards are
/// dropped out of order.
#[derive(Debug)]
pub struct Protected {
    stack: ProtectionStack,
    obj: Sexp,
    index: usize,
    serial: u64,
}

impl Protected {
    /// The protected object.
    pub fn get(&self) -> Sexp {
        self.obj
    }

    /// Protects `obj` in place of the current object.
    pub fn replace(&mut self, obj: Sexp) {
        let mut inner = self.stack.inner.borrow_mut();
        if let Some(i) = inner.position_of(self.index, self.serial) {
            inner.entries[i].obj = obj;
        }
        self.obj = obj;
    }
}

impl Drop for Protected {
    fn drop(&mut self) {
        let mut inner = self.stack.inner.borrow_mut();
        if let Some(i) = inner.position_of(self.index, self.serial) {
            inner.entries.remove(i);
        }
    }
}
