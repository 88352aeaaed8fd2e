//! The iterator protocol.
//!
//! [`StorageIter`] is a stateful, single-consumer, non-restartable cursor.
//! Exhaustion is signaled by the [`StorageError::IterationDone`] sentinel,
//! never by a value-free success. Pulling past exhaustion keeps returning
//! the sentinel.

use std::collections::VecDeque;
use std::fmt;

use crate::error::{StorageError, StorageResult};
use crate::object::{Object, Part};

/// Lazy page-fetch callback: returns the next page of items, or an empty
/// page once the underlying sequence is exhausted.
type PageFn<T> = Box<dyn FnMut() -> StorageResult<Vec<T>> + Send>;

/// A single-consumer cursor over a sequence of `T`.
///
/// # Examples
///
/// ```
/// use polystore_types::{Part, StorageIter};
///
/// let mut it = StorageIter::from_vec(vec![Part { index: 0, size: 4 }]);
/// assert!(it.next().is_ok());
/// assert!(it.next().is_err_and(|e| e.is_iteration_done()));
/// assert!(it.next().is_err_and(|e| e.is_iteration_done()));
/// ```
pub struct StorageIter<T> {
    buffer: VecDeque<T>,
    fetch: Option<PageFn<T>>,
    done: bool,
}

/// Iterator over [`Object`]s, returned by `list` and `list_dir`.
pub type ObjectIterator = StorageIter<Object>;

/// Iterator over [`Part`]s, returned by `list_multipart`.
pub type PartIterator = StorageIter<Part>;

impl<T> StorageIter<T> {
    /// Build an iterator over a materialized sequence.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            buffer: items.into(),
            fetch: None,
            done: false,
        }
    }

    /// Build a lazy iterator driven by a page-fetch callback.
    ///
    /// `fetch` is pulled whenever the internal buffer runs dry; an empty
    /// page marks the sequence exhausted and `fetch` is never called again.
    #[must_use]
    pub fn with_pager(fetch: impl FnMut() -> StorageResult<Vec<T>> + Send + 'static) -> Self {
        Self {
            buffer: VecDeque::new(),
            fetch: Some(Box::new(fetch)),
            done: false,
        }
    }

    /// Pull the next item.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IterationDone`] once the sequence is
    /// exhausted (and on every pull thereafter), or a fetch error
    /// propagated from the page callback.
    pub fn next(&mut self) -> StorageResult<T> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(item);
            }
            if self.done {
                return Err(StorageError::IterationDone);
            }
            match self.fetch.as_mut() {
                Some(fetch) => {
                    let page = fetch()?;
                    if page.is_empty() {
                        self.done = true;
                        self.fetch = None;
                    } else {
                        self.buffer.extend(page);
                    }
                }
                None => {
                    self.done = true;
                }
            }
        }
    }

    /// Drain the remaining items into a `Vec`.
    ///
    /// # Errors
    ///
    /// Propagates any fetch error; the done sentinel itself is absorbed.
    pub fn collect_remaining(&mut self) -> StorageResult<Vec<T>> {
        let mut out = Vec::new();
        loop {
            match self.next() {
                Ok(item) => out.push(item),
                Err(err) if err.is_iteration_done() => return Ok(out),
                Err(err) => return Err(err),
            }
        }
    }
}

impl<T> fmt::Debug for StorageIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageIter")
            .field("buffered", &self.buffer.len())
            .field("lazy", &self.fetch.is_some())
            .field("done", &self.done)
            .finish()
    }
}
