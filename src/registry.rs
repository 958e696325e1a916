//! Per-type coercion and rendering side tables.
//!
//! A registered coercion is tried before every built-in strategy for fields
//! of exactly that type; a registered rendering is preferred by the writer.
//! Entries are keyed by [`TypeId`], so a registration for `u32` does not
//! apply to `Option<u32>` fields' inner values any differently: the inner
//! type is what gets looked up.
//!
//! There is one process-wide registry, guarded by a `RwLock` and shared as
//! an `Arc` snapshot: readers take the current snapshot and never hold the
//! lock while converting, and registering copies the tables only when a
//! snapshot is still in use. Register once at startup, before reading. Builders can also carry their own entries,
//! which take precedence over the global ones for that builder only.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::error::BoxError;
use crate::value::Value;

/// A registered text-to-value conversion. The flag is `true` for a blank
/// assignment, in which case the text is empty.
pub type CoerceFn<T> = Arc<dyn Fn(bool, &str) -> Result<T, BoxError> + Send + Sync>;

/// A registered value-to-text rendering.
pub type RenderFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    coercions: HashMap<TypeId, Entry>,
    renderings: HashMap<TypeId, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the coercion for `T`, replacing any earlier one.
    pub fn register_coercion<T, F>(&mut self, f: F)
    where
        T: Value,
        F: Fn(bool, &str) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let f: CoerceFn<T> = Arc::new(f);
        self.coercions.insert(TypeId::of::<T>(), Arc::new(f));
    }

    /// Register the rendering for `T`, replacing any earlier one.
    pub fn register_rendering<T, F>(&mut self, f: F)
    where
        T: Value,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        let f: RenderFn<T> = Arc::new(f);
        self.renderings.insert(TypeId::of::<T>(), Arc::new(f));
    }

    pub fn coercion<T: Value>(&self) -> Option<&CoerceFn<T>> {
        self.coercions
            .get(&TypeId::of::<T>())?
            .downcast_ref::<CoerceFn<T>>()
    }

    pub fn rendering<T: Value>(&self) -> Option<&RenderFn<T>> {
        self.renderings
            .get(&TypeId::of::<T>())?
            .downcast_ref::<RenderFn<T>>()
    }

    pub fn is_empty(&self) -> bool {
        self.coercions.is_empty() && self.renderings.is_empty()
    }

    pub fn clear(&mut self) {
        self.coercions.clear();
        self.renderings.clear();
    }

    /// A copy of `self` with `top`'s entries replacing matching ones.
    pub fn layered(&self, top: &Registry) -> Registry {
        let mut out = self.clone();
        out.coercions
            .extend(top.coercions.iter().map(|(k, v)| (*k, Arc::clone(v))));
        out.renderings
            .extend(top.renderings.iter().map(|(k, v)| (*k, Arc::clone(v))));
        out
    }
}

static GLOBAL: LazyLock<RwLock<Arc<Registry>>> = LazyLock::new(Default::default);

/// The current process-wide registry. Later registrations do not affect a
/// snapshot already taken.
pub fn global() -> Arc<Registry> {
    Arc::clone(&*GLOBAL.read().unwrap_or_else(PoisonError::into_inner))
}

fn update(f: impl FnOnce(&mut Registry)) {
    let mut guard = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    f(Arc::make_mut(&mut *guard));
}

/// Register a process-wide coercion for fields of type `T`.
///
/// Subsequent assignments to `T` fields call `f` ahead of all built-in
/// strategies. A later registration for the same type replaces this one.
pub fn register_type_coercion<T, F>(f: F)
where
    T: Value,
    F: Fn(bool, &str) -> Result<T, BoxError> + Send + Sync + 'static,
{
    update(|registry| registry.register_coercion(f));
}

/// Register a process-wide rendering for values of type `T`.
pub fn register_type_rendering<T, F>(f: F)
where
    T: Value,
    F: Fn(&T) -> String + Send + Sync + 'static,
{
    update(|registry| registry.register_rendering(f));
}

/// Drop every process-wide registration.
pub fn clear_type_registrations() {
    update(Registry::clear);
}
