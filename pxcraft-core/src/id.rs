//! # IDs
//! Documents and layers need an identity that survives cloning into a new snapshot but is never
//! confused with another object. This is [`Id<T>`], unique within one run of the program and
//! namespaced by the marker type `T`.
//!
//! IDs are never written into project files. Reading a file hands out fresh ones.

use std::sync::atomic::{AtomicU64, Ordering};

// Next free raw ID, by namespace.
static ID_SERVER: parking_lot::RwLock<std::collections::BTreeMap<std::any::TypeId, AtomicU64>> =
    parking_lot::const_rwlock(std::collections::BTreeMap::new());

/// ID that is unique within this execution of the program.
/// IDs with different namespaces may share a raw value but can never be compared.
pub struct Id<T: std::any::Any> {
    id: std::num::NonZeroU64,
    // `fn() -> T` so the marker doesn't leak its auto traits onto the ID.
    _namespace: std::marker::PhantomData<fn() -> T>,
}
impl<T: std::any::Any> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for Id<T> {}
impl<T: std::any::Any> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T: std::any::Any> Eq for Id<T> {}
impl<T: std::any::Any> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: std::any::Any> Id<T> {
    /// Allocate a new, never before seen ID in the namespace `T`.
    #[must_use]
    pub fn new() -> Self {
        let ty = std::any::TypeId::of::<T>();
        let raw = {
            let read = ID_SERVER.upgradable_read();
            if let Some(next) = read.get(&ty) {
                next.fetch_add(1, Ordering::Relaxed)
            } else {
                // First ID of this namespace. Only happens a handful of times per run.
                let mut write = parking_lot::RwLockUpgradableReadGuard::upgrade(read);
                // Another thread may have raced us between the read and the upgrade.
                write
                    .entry(ty)
                    .or_insert_with(|| AtomicU64::new(1))
                    .fetch_add(1, Ordering::Relaxed)
            }
        };
        let Some(id) = std::num::NonZeroU64::new(raw) else {
            log::error!("{} ID overflow!", std::any::type_name::<T>());
            panic!("{} ID overflow!", std::any::type_name::<T>());
        };
        Self {
            id,
            _namespace: std::marker::PhantomData,
        }
    }
    /// Get the raw numeric value of this ID.
    /// IDs from differing namespaces may share the same numeric ID!
    #[must_use]
    pub fn get(&self) -> u64 {
        self.id.get()
    }
}
impl<T: std::any::Any> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T: std::any::Any> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = std::any::type_name::<T>();
        // Last path segment, which is the whole string when there is no `::`.
        let short = name.rsplit("::").next().unwrap_or(name);
        write!(f, "{short}#{}", self.id)
    }
}
impl<T: std::any::Any> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::Id;

    // Tests share the global server, so each one gets its own namespace.

    #[test]
    fn ids_unique() {
        struct Namespace;
        let mut ids: Vec<u64> = (0..1024).map(|_| Id::<Namespace>::new().get()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(before, ids.len(), "had duplicate ids");
    }
    #[test]
    fn ids_unique_across_threads() {
        struct Namespace;
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..256).map(|_| Id::<Namespace>::new().get()).collect::<Vec<_>>()))
            .collect();
        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 1024);
    }
    #[test]
    fn copies_compare_equal() {
        struct Namespace;
        let a = Id::<Namespace>::new();
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, Id::<Namespace>::new());
    }
    #[test]
    fn display_names_namespace() {
        struct Marker;
        let id = Id::<Marker>::new();
        assert_eq!(id.to_string(), format!("Marker#{}", id.get()));
    }
}
