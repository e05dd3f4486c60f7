#![forbid(unsafe_code)]

//! Fluent construction of a [`DirectionalSpec`].
//!
//! ```ignore
//! use kinetic_core::{Breakpoint, DirectionalSpec, Guarantee, Mapping, SemanticKey};
//!
//! let expanded = SemanticKey::<bool>::new("expanded");
//! let spec = DirectionalSpec::builder(Mapping::Zero)
//!     .semantic(&expanded, false)
//!     .breakpoint(
//!         Breakpoint::new("expand", 100.0).with_guarantee(Guarantee::InputDelta(20.0)),
//!         Mapping::Fixed(1.0),
//!     )
//!     .semantic(&expanded, true)
//!     .build()?;
//! ```

use std::sync::Arc;

use super::{Breakpoint, DirectionalSpec};
use crate::error::Result;
use crate::mapping::Mapping;
use crate::semantics::{SemanticKey, SemanticValue};

/// Builder for [`DirectionalSpec`]. Validation happens in
/// [`build`](Self::build).
#[derive(Debug)]
pub struct DirectionalSpecBuilder {
    breakpoints: Vec<Breakpoint>,
    mappings: Vec<Mapping>,
    semantics: Vec<(Arc<str>, usize, Arc<dyn SemanticValue>)>,
}

impl DirectionalSpecBuilder {
    #[must_use]
    pub fn new(initial: Mapping) -> Self {
        Self {
            breakpoints: Vec::new(),
            mappings: vec![initial],
            semantics: Vec::new(),
        }
    }

    /// Add `breakpoint`, followed by a segment using `mapping`.
    #[must_use]
    pub fn breakpoint(mut self, breakpoint: Breakpoint, mapping: Mapping) -> Self {
        self.breakpoints.push(breakpoint);
        self.mappings.push(mapping);
        self
    }

    /// Attach `value` to the most recently added segment. Segments after it
    /// inherit the value until another one is declared.
    #[must_use]
    pub fn semantic<T: SemanticValue>(mut self, key: &SemanticKey<T>, value: T) -> Self {
        let segment = self.mappings.len() - 1;
        self.semantics
            .push((Arc::from(key.name()), segment, Arc::new(value)));
        self
    }

    pub fn build(self) -> Result<DirectionalSpec> {
        DirectionalSpec::from_parts(self.breakpoints, self.mappings, self.semantics)
    }
}
