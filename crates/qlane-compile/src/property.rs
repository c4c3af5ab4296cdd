//! `PropertySet` for pass communication.
//!
//! Passes share results through a [`PropertySet`]: a few standard fields
//! plus a type-keyed map of custom values. The barrier resolution passes
//! store their [`ResolutionReport`](crate::resolve::ResolutionReport) here,
//! and verification passes read it back.
//!
//! ```
//! use qlane_compile::PropertySet;
//!
//! #[derive(Debug, PartialEq)]
//! struct PaddingTotal(u64);
//!
//! let mut props = PropertySet::new().with_function("main");
//! props.insert(PaddingTotal(40));
//!
//! assert_eq!(props.function.as_deref(), Some("main"));
//! assert_eq!(props.get::<PaddingTotal>(), Some(&PaddingTotal(40)));
//! ```

use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};

/// Shared state for a pass pipeline run.
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Name of the function being compiled, for diagnostics.
    pub function: Option<String>,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the function name.
    #[must_use]
    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }

    /// Insert a custom property, replacing any value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}
