//! Base contract for GPU-resident resources: identity and locking.

use super::Id;
use std::any::Any;

/// Identifies the concrete kind of a context-owned resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassId {
    /// A 2D texture surface.
    Texture,
    /// A six-faced cube texture.
    CubeTexture,
    /// An indexed geometry buffer.
    Primitive,
    /// A shader program.
    Shader,
    /// A color palette.
    Palette,
}

/// Requested or granted access mode for a resource's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockType {
    /// Not locked.
    #[default]
    None,
    /// Read-only access.
    Read,
    /// Write-only access.
    Write,
    /// Full read/write access.
    ReadWrite,
}

impl LockType {
    /// Whether this mode grants exclusive (writing) access.
    #[inline]
    pub fn is_exclusive(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }

    /// Whether this mode grants any access at all.
    #[inline]
    pub fn is_locked(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A resource owned by a rendering back-end: texture, primitive, shader,
/// palette.
///
/// A resource must be locked before its contents are read or written, and
/// unlocked afterwards; use [`Lock`] to guarantee the pairing. The default
/// implementations form the no-op contract for back-ends whose resources
/// need no CPU-side mapping: lock always succeeds with full access.
///
/// Resources are tracked by their creating context through weak references
/// and receive [`invalidate`](ContextObject::invalidate) when the context is
/// torn down.
pub trait ContextObject {
    /// The concrete resource kind.
    fn class_id(&self) -> ClassId;

    /// Unique object ID.
    fn id(&self) -> Id;

    /// Acquire access to the resource contents. Returns the granted mode.
    ///
    /// Locking a resource that is already exclusively locked is a contract
    /// violation.
    fn lock(&self, lock: LockType) -> LockType {
        let _ = lock;
        LockType::ReadWrite
    }

    /// Release access acquired by [`lock`](ContextObject::lock).
    fn unlock(&self) {}

    /// The currently held lock mode.
    fn lock_type(&self) -> LockType {
        LockType::None
    }

    /// Called by the owning context on teardown; the resource must stop
    /// referencing device state afterwards.
    fn invalidate(&self) {}

    /// Downcast support for back-end implementations.
    fn as_any(&self) -> &dyn Any;
}

/// Scoped lock on a [`ContextObject`].
///
/// Constructing the guard locks the resource; dropping it unlocks, on every
/// exit path including unwinding.
pub struct Lock<'a> {
    object: &'a dyn ContextObject,
    granted: LockType,
}

impl<'a> Lock<'a> {
    /// Lock `object` with the requested access mode.
    pub fn new(object: &'a dyn ContextObject, lock: LockType) -> Self {
        let granted = object.lock(lock);
        Self { object, granted }
    }

    /// The access mode the back-end granted.
    #[inline]
    pub fn granted(&self) -> LockType {
        self.granted
    }
}

impl Drop for Lock<'_> {
    fn drop(&mut self) {
        self.object.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    struct CountingResource {
        id: Id,
        locks: Cell<u32>,
        unlocks: Cell<u32>,
        state: Cell<LockType>,
    }

    impl CountingResource {
        fn new() -> Self {
            Self {
                id: Id::new(),
                locks: Cell::new(0),
                unlocks: Cell::new(0),
                state: Cell::new(LockType::None),
            }
        }
    }

    impl ContextObject for CountingResource {
        fn class_id(&self) -> ClassId {
            ClassId::Primitive
        }

        fn id(&self) -> Id {
            self.id
        }

        fn lock(&self, lock: LockType) -> LockType {
            assert!(
                !self.state.get().is_exclusive(),
                "resource is already exclusively locked"
            );
            self.locks.set(self.locks.get() + 1);
            self.state.set(lock);
            lock
        }

        fn unlock(&self) {
            self.unlocks.set(self.unlocks.get() + 1);
            self.state.set(LockType::None);
        }

        fn lock_type(&self) -> LockType {
            self.state.get()
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn test_lock_guard_balances() {
        let res = CountingResource::new();
        {
            let guard = Lock::new(&res, LockType::Write);
            assert_eq!(guard.granted(), LockType::Write);
            assert_eq!(res.lock_type(), LockType::Write);
        }
        assert_eq!(res.locks.get(), 1);
        assert_eq!(res.unlocks.get(), 1);
        assert_eq!(res.lock_type(), LockType::None);
    }

    #[test]
    fn test_lock_guard_unlocks_on_panic() {
        let res = CountingResource::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = Lock::new(&res, LockType::ReadWrite);
            panic!("mid-scope failure");
        }));
        assert!(result.is_err());
        assert_eq!(res.locks.get(), 1);
        assert_eq!(res.unlocks.get(), 1);
    }

    #[test]
    #[should_panic(expected = "already exclusively locked")]
    fn test_double_exclusive_lock_asserts() {
        let res = CountingResource::new();
        let _first = Lock::new(&res, LockType::Write);
        let _second = Lock::new(&res, LockType::Read);
    }

    #[test]
    fn test_default_contract_is_noop() {
        struct Plain(Id);
        impl ContextObject for Plain {
            fn class_id(&self) -> ClassId {
                ClassId::Shader
            }
            fn id(&self) -> Id {
                self.0
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }
        let p = Plain(Id::new());
        assert_eq!(p.lock(LockType::Read), LockType::ReadWrite);
        p.unlock();
        assert_eq!(p.lock_type(), LockType::None);
    }
}
