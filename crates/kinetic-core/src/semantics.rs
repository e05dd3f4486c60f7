#![forbid(unsafe_code)]

//! Typed per-segment values attached to a spec.
//!
//! A spec can label each segment with arbitrary values ("expanded",
//! a haptic id, a debug label). Values are looked up by a typed
//! [`SemanticKey`]; a segment that does not declare a value inherits the
//! value of the closest preceding segment that does.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A value that can be attached to a segment.
pub trait SemanticValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> SemanticValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Typed handle to a semantic value. Keys are identified by name.
pub struct SemanticKey<T> {
    name: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SemanticKey<T> {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for SemanticKey<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SemanticKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SemanticKey").field(&self.name).finish()
    }
}

/// One key's values across all segments of a directional spec, already
/// backfilled.
#[derive(Clone)]
pub(crate) struct SemanticTrack {
    name: Arc<str>,
    values: Vec<Option<Arc<dyn SemanticValue>>>,
}

impl SemanticTrack {
    /// Build a track from sparse declarations `(segment_index, value)`.
    /// Later declarations for the same segment win.
    pub(crate) fn backfilled(
        name: Arc<str>,
        declared: &[(usize, Arc<dyn SemanticValue>)],
        segment_count: usize,
    ) -> Self {
        let mut values: Vec<Option<Arc<dyn SemanticValue>>> = vec![None; segment_count];
        for (index, value) in declared {
            if let Some(slot) = values.get_mut(*index) {
                *slot = Some(Arc::clone(value));
            }
        }
        let mut carried: Option<Arc<dyn SemanticValue>> = None;
        for slot in &mut values {
            if let Some(value) = slot {
                carried = Some(Arc::clone(value));
            } else {
                *slot = carried.clone();
            }
        }
        Self { name, values }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn value_at(&self, segment_index: usize) -> Option<&dyn SemanticValue> {
        self.values.get(segment_index)?.as_deref()
    }
}

impl fmt::Debug for SemanticTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticTrack")
            .field("name", &self.name)
            .field("values", &self.values)
            .finish()
    }
}

/// Downcast a stored semantic value to `T`.
pub(crate) fn downcast<T: Clone + 'static>(value: &dyn SemanticValue) -> Option<T> {
    value.as_any().downcast_ref::<T>().cloned()
}
