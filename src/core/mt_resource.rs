use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted value shared between the main loop and the
/// chunk builder worker.
///
/// `MtResource` wraps an `Arc<RwLock<T>>`. Clones share the same value, so a
/// world handed to the worker and the copy held by the main loop observe the
/// same state.
///
/// # Examples
///
/// ```
/// use voxel_chunk_builder::core::MtResource;
///
/// let loaded = MtResource::new(Vec::<u32>::new());
/// let handle = loaded.clone();
///
/// handle.get_mut().push(7);
/// assert_eq!(loaded.get().len(), 1);
/// ```
///
/// # Poisoning
/// A panic while a guard is held poisons the lock. The guarded values in this
/// crate are plain data that stay valid across an unwinding panic, so the
/// poison is cleared and the guard handed out anyway.
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard over the contained value.
    ///
    /// Several readers may hold a guard at the same time.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an exclusive write guard over the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the contained value, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.get_mut(), value)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T: Send + Sync + Default + 'static> Default for MtResource<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
