//! The facet abstraction itself (`spec.md` §4.2).
//!
//! Two traits cover the two kinds of thing a [`crate::context::Context`]
//! stores:
//!
//! - [`Slot`]: anything storable at all — the blanket impl means every
//!   `Clone + Default + 'static` type is automatically a valid context
//!   slot, keyed by its own [`std::any::TypeId`]. This is the systems-language
//!   reading of "facet identifier": a compile-time-stable identifier is
//!   exactly what `TypeId` is, so no hand-maintained facet-id enum is
//!   needed (contrast with [`crate::hooks::HookKey`], which *does* need one
//!   because many distinct hook registrations share one payload shape).
//! - [`NamedFacet`]: the subset of slots that are genuine `spec.md` §4.2
//!   facets — key-value maps with a declared default, subject to the
//!   debug-mode mutation broadcast. [`map_facet`] builds one of these plus
//!   its `get`/`set`/`get_whole`/`set_whole`/`update`/`delete` operations in
//!   one shot.

use std::any::Any;

pub trait Slot: Any + Clone + Default + 'static {}
impl<T: Any + Clone + Default + 'static> Slot for T {}

/// A facet with a stable name, used to build the debug-mode mutation
/// broadcast key (`spec.md` §4.2: "keyed by `(Facet, operation)` and
/// `(specific-facet, operation)`" — see [`crate::hooks::facet_mutation_key`]).
pub trait NamedFacet: Slot {
    const NAME: &'static str;
}

/// Declares a facet backed by a [`pyata_collections::PersistentMap`]: a
/// typed keyed extension with a declared per-key default, matching
/// `spec.md` §4.2's `get`/`set`/`get_whole`/`set_whole`/`update`/`delete`
/// operation set. Grounded on the original's `FacetABC`
/// (`pyata/core/Facets.py`), which every concrete facet (`Substitutions`,
/// `Constraints`, `VarsReifiers`, `Metrics`, ...) subclasses for exactly
/// this operation set.
macro_rules! map_facet {
    ($(#[$meta:meta])* $vis:vis struct $name:ident($key:ty => $val:ty) default($default_fn:expr) name($facet_name:literal);) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis struct $name(::pyata_collections::PersistentMap<$key, $val>);

        impl Default for $name {
            fn default() -> Self {
                $name(::pyata_collections::PersistentMap::new())
            }
        }

        impl $crate::facet::NamedFacet for $name {
            const NAME: &'static str = $facet_name;
        }

        impl $name {
            pub fn get_whole(&self) -> &::pyata_collections::PersistentMap<$key, $val> {
                &self.0
            }

            pub fn get(&self, key: &$key) -> $val {
                self.0.get(key).cloned().unwrap_or_else($default_fn)
            }

            pub fn get_opt(&self, key: &$key) -> Option<$val> {
                self.0.get(key).cloned()
            }

            #[must_use]
            pub fn set(&self, key: $key, val: $val) -> Self {
                $name(self.0.set(key, val))
            }

            #[must_use]
            pub fn set_whole(&self, whole: ::pyata_collections::PersistentMap<$key, $val>) -> Self {
                $name(whole)
            }

            #[must_use]
            pub fn update<I: IntoIterator<Item = ($key, $val)>>(&self, pairs: I) -> Self {
                $name(self.0.update(pairs))
            }

            #[must_use]
            pub fn delete(&self, key: &$key) -> Self {
                $name(self.0.remove(key))
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }
    };
}

pub(crate) use map_facet;
