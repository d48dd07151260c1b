use crate::bounded::BoundedVec;
use crate::error::FramePoolError;
use crate::pool::FramePool;
use kernel_memory_addresses::{FrameNumber, PhysMemory};

/// Upper bound on simultaneously registered pools.
pub const MAX_POOLS: usize = 8;

/// Handle to a pool inside a [`FrameRegistry`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PoolId(usize);

/// All frame pools the kernel knows about.
///
/// Frames are released by bare frame number (a page-table entry does not
/// remember which pool its frame came from), so something must map a frame
/// number back to its owning pool. The registry is that something: an
/// explicit object built during initialization and threaded by reference
/// through the paging code.
#[derive(Debug, Default)]
pub struct FrameRegistry {
    pools: BoundedVec<FramePool, MAX_POOLS>,
}

impl FrameRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pools: BoundedVec::new(),
        }
    }

    /// Add a pool, transferring ownership to the registry.
    pub fn register(&mut self, pool: FramePool) -> Result<PoolId, FramePoolError> {
        let id = self.pools.push(pool)?;
        Ok(PoolId(id))
    }

    /// Borrow a registered pool.
    ///
    /// # Panics
    /// If `id` came from a different registry and is out of range.
    #[must_use]
    pub fn pool(&self, id: PoolId) -> &FramePool {
        &self.pools[id.0]
    }

    /// Borrow a registered pool mutably.
    ///
    /// # Panics
    /// If `id` came from a different registry and is out of range.
    #[must_use]
    pub fn pool_mut(&mut self, id: PoolId) -> &mut FramePool {
        &mut self.pools[id.0]
    }

    /// Release an allocated sequence without knowing its pool.
    ///
    /// Scans registered pools for the one whose range contains `head` and
    /// delegates to it; fails with [`FramePoolError::UnknownFrame`] when no
    /// pool claims the frame.
    pub fn release_frames<P: PhysMemory + ?Sized>(
        &mut self,
        phys: &mut P,
        head: FrameNumber,
    ) -> Result<u32, FramePoolError> {
        match self.pools.iter_mut().find(|pool| pool.contains(head)) {
            Some(pool) => pool.release_frames(phys, head),
            None => {
                log::error!("release of {head:?}, which no registered pool manages");
                Err(FramePoolError::UnknownFrame(head))
            }
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.pools.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::BitmapHost;
    use kernel_machine::PhysRam;

    fn two_pool_registry(ram: &mut PhysRam) -> (FrameRegistry, PoolId, PoolId) {
        let low = FramePool::new(ram, FrameNumber::new(0), 64, BitmapHost::SelfHosted).unwrap();
        let high = FramePool::new(ram, FrameNumber::new(128), 64, BitmapHost::SelfHosted).unwrap();
        let mut registry = FrameRegistry::new();
        let low_id = registry.register(low).unwrap();
        let high_id = registry.register(high).unwrap();
        (registry, low_id, high_id)
    }

    #[test]
    fn release_routes_to_the_owning_pool() {
        let mut ram = PhysRam::with_frames(192);
        let (mut registry, low, high) = two_pool_registry(&mut ram);

        let a = registry.pool_mut(low).get_frames(&mut ram, 4).unwrap();
        let b = registry.pool_mut(high).get_frames(&mut ram, 4).unwrap();
        assert!(registry.pool(low).contains(a));
        assert!(registry.pool(high).contains(b));

        assert_eq!(registry.release_frames(&mut ram, b), Ok(4));
        assert_eq!(registry.release_frames(&mut ram, a), Ok(4));
        assert_eq!(registry.pool(low).free_count(), 63);
        assert_eq!(registry.pool(high).free_count(), 63);
    }

    #[test]
    fn unowned_frames_are_rejected() {
        let mut ram = PhysRam::with_frames(192);
        let (mut registry, _, _) = two_pool_registry(&mut ram);

        // Frame 100 falls in the gap between the two pools.
        assert_eq!(
            registry.release_frames(&mut ram, FrameNumber::new(100)),
            Err(FramePoolError::UnknownFrame(FrameNumber::new(100)))
        );
    }

    #[test]
    fn registry_capacity_is_bounded() {
        let mut ram = PhysRam::with_frames(4096);
        let mut registry = FrameRegistry::new();
        for i in 0..MAX_POOLS {
            let base = FrameNumber::new((i * 16) as u32);
            let pool = FramePool::new(&mut ram, base, 16, BitmapHost::SelfHosted).unwrap();
            registry.register(pool).unwrap();
        }

        let extra = FramePool::new(
            &mut ram,
            FrameNumber::new(2048),
            16,
            BitmapHost::SelfHosted,
        )
        .unwrap();
        assert!(matches!(
            registry.register(extra),
            Err(FramePoolError::RegistryFull(_))
        ));
    }
}
