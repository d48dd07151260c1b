//! End-to-end demand paging: frame pools, an address space with paging
//! enabled, and virtual-memory pools allocating, touching and releasing
//! regions on the simulated machine.

use kernel_frames::{BitmapHost, FramePool, FrameRegistry};
use kernel_info::memory::{
    KERNEL_POOL_FRAMES, KERNEL_POOL_START_FRAME, PROCESS_POOL_FRAMES, PROCESS_POOL_START_FRAME,
    SHARED_SIZE,
};
use kernel_machine::Machine;
use kernel_memory_addresses::{FrameNumber, PAGE_SIZE, VirtualAddress};
use kernel_vmem::{AddressSpace, PagingConfig, VmAccess, VmPool, VmemError, resolve};

const POOL_BASE: VirtualAddress = VirtualAddress::new(0x4000_0000);
const POOL_SIZE: u32 = 1024 * 1024;

struct Fixture {
    machine: Machine,
    registry: FrameRegistry,
    config: PagingConfig,
    space: AddressSpace,
}

impl Fixture {
    fn new() -> Self {
        kernel_machine::init_test_logging();
        let mut machine = Machine::new();
        let kernel = FramePool::new(
            &mut machine.ram,
            FrameNumber::new(KERNEL_POOL_START_FRAME),
            KERNEL_POOL_FRAMES,
            BitmapHost::SelfHosted,
        )
        .unwrap();
        let process = FramePool::new(
            &mut machine.ram,
            FrameNumber::new(PROCESS_POOL_START_FRAME),
            PROCESS_POOL_FRAMES,
            BitmapHost::SelfHosted,
        )
        .unwrap();
        let mut registry = FrameRegistry::new();
        let config = PagingConfig {
            kernel_pool: registry.register(kernel).unwrap(),
            process_pool: registry.register(process).unwrap(),
            shared_size: SHARED_SIZE,
        };
        let space = AddressSpace::new(&mut registry, &config, &mut machine.ram).unwrap();
        space.load(&mut machine.regs);
        space.enable_paging(&mut machine.regs).unwrap();
        Self {
            machine,
            registry,
            config,
            space,
        }
    }

    fn pool(&mut self, size: u32) -> VmPool {
        VmPool::new(
            &mut self.space,
            &mut self.registry,
            &self.config,
            &mut self.machine.ram,
            &mut self.machine.regs,
            POOL_BASE,
            size,
        )
        .unwrap()
    }

    fn vm(&mut self) -> VmAccess<'_, kernel_machine::PhysRam, kernel_machine::RegisterFile> {
        VmAccess {
            space: &self.space,
            registry: &mut self.registry,
            config: &self.config,
            phys: &mut self.machine.ram,
            hw: &mut self.machine.regs,
        }
    }

    fn kernel_free(&self) -> u32 {
        self.registry.pool(self.config.kernel_pool).free_count()
    }

    fn process_free(&self) -> u32 {
        self.registry.pool(self.config.process_pool).free_count()
    }
}

#[test]
fn pool_bootstraps_through_its_own_page_fault() {
    let mut fx = Fixture::new();
    let kernel_before = fx.kernel_free();
    let process_before = fx.process_free();

    let pool = fx.pool(POOL_SIZE);
    assert_eq!(fx.space.pool_count(), 1);

    // The bookkeeping page cost one data frame, plus one kernel frame for
    // the page table of the pool's 4 MiB slot.
    assert_eq!(fx.process_free(), process_before - 1);
    assert_eq!(fx.kernel_free(), kernel_before - 1);

    // Seeded bookkeeping: the page itself is allocated, the rest is free.
    let mut vm = fx.vm();
    assert_eq!(vm.read_u32(POOL_BASE).unwrap(), POOL_BASE.as_u32());
    assert_eq!(vm.read_u32(POOL_BASE + 4).unwrap(), PAGE_SIZE);
    assert_eq!(
        vm.read_u32(POOL_BASE + 2048).unwrap(),
        (POOL_BASE + PAGE_SIZE).as_u32()
    );
    assert_eq!(vm.read_u32(POOL_BASE + 2052).unwrap(), POOL_SIZE - PAGE_SIZE);

    // Only the bookkeeping page is a legitimate address so far.
    assert!(pool.is_legitimate(&fx.machine.ram, &fx.machine.regs, POOL_BASE + 100));
    assert!(!pool.is_legitimate(&fx.machine.ram, &fx.machine.regs, POOL_BASE + PAGE_SIZE));
}

#[test]
fn allocated_regions_are_backed_on_first_touch() {
    let mut fx = Fixture::new();
    let pool = fx.pool(POOL_SIZE);

    let mut vm = fx.vm();
    // 100 bytes rounds up to one page; first fit hands out consecutive
    // regions right after the bookkeeping page.
    let a = pool.allocate(&mut vm, 100).unwrap().unwrap();
    let b = pool.allocate(&mut vm, 100).unwrap().unwrap();
    assert_eq!(a, POOL_BASE + PAGE_SIZE);
    assert_eq!(b, POOL_BASE + 2 * PAGE_SIZE);

    vm.write_u32(a, 0xAAAA_5555).unwrap();
    vm.write_u32(b, 0x1234_5678).unwrap();
    assert_eq!(vm.read_u32(a).unwrap(), 0xAAAA_5555);
    assert_eq!(vm.read_u32(b).unwrap(), 0x1234_5678);

    // Distinct pages sit on distinct physical frames.
    let pa = resolve(&fx.machine.ram, &fx.machine.regs, a).unwrap();
    let pb = resolve(&fx.machine.ram, &fx.machine.regs, b).unwrap();
    assert_ne!(pa.frame(), pb.frame());
    assert!(fx
        .registry
        .pool(fx.config.process_pool)
        .contains(pa.frame()));
}

#[test]
fn each_4mib_slot_gets_its_own_page_table() {
    let mut fx = Fixture::new();
    let pool = fx.pool(8 * 1024 * 1024);
    let kernel_after_pool = fx.kernel_free();

    // A 4 MiB region starting one page into slot 256 reaches into slot 257.
    let mut vm = fx.vm();
    let region = pool.allocate(&mut vm, 4 * 1024 * 1024).unwrap().unwrap();
    let far = region + (4 * 1024 * 1024 - PAGE_SIZE);
    assert_ne!(far.directory_index(), region.directory_index());

    // Touching the near end reuses the table built for the bookkeeping page.
    vm.write_u32(region, 1).unwrap();
    assert_eq!(fx.kernel_free(), kernel_after_pool);

    // Touching the far end demands a table for the new slot.
    let mut vm = fx.vm();
    vm.write_u32(far, 2).unwrap();
    assert_eq!(vm.read_u32(far).unwrap(), 2);
    assert_eq!(fx.kernel_free(), kernel_after_pool - 1);
}

#[test]
fn unclaimed_addresses_are_fatal() {
    let mut fx = Fixture::new();
    let _pool = fx.pool(POOL_SIZE);

    let mut vm = fx.vm();
    // Inside the pool but not allocated.
    let inside = POOL_BASE + 0x8_0000;
    assert_eq!(
        vm.write_u32(inside, 1),
        Err(VmemError::IllegalAddress(inside))
    );
    // Nowhere near any pool.
    let outside = VirtualAddress::new(0x5000_0000);
    assert_eq!(
        vm.read_u32(outside),
        Err(VmemError::IllegalAddress(outside))
    );
}

#[test]
fn release_unmaps_and_returns_every_frame() {
    let mut fx = Fixture::new();
    let pool = fx.pool(POOL_SIZE);
    let process_before = fx.process_free();

    let mut vm = fx.vm();
    let region = pool.allocate(&mut vm, 3 * PAGE_SIZE).unwrap().unwrap();
    for page in 0..3 {
        vm.write_u32(region + page * PAGE_SIZE, page).unwrap();
    }
    assert_eq!(fx.process_free(), process_before - 3);

    let mut vm = fx.vm();
    pool.release(&mut vm, region).unwrap();
    assert_eq!(fx.process_free(), process_before);
    assert!(resolve(&fx.machine.ram, &fx.machine.regs, region).is_err());
    assert!(!pool.is_legitimate(&fx.machine.ram, &fx.machine.regs, region));

    // Double release is a contract violation.
    let mut vm = fx.vm();
    assert_eq!(
        pool.release(&mut vm, region),
        Err(VmemError::UnknownRegion(region))
    );
    // So is releasing something that was never a region base.
    assert_eq!(
        pool.release(&mut vm, region + 4),
        Err(VmemError::UnknownRegion(region + 4))
    );
}

#[test]
fn released_regions_do_not_coalesce() {
    let mut fx = Fixture::new();
    // 4 pages: bookkeeping + 3 allocatable.
    let pool = fx.pool(4 * PAGE_SIZE);

    let mut vm = fx.vm();
    let a = pool.allocate(&mut vm, PAGE_SIZE).unwrap().unwrap();
    let b = pool.allocate(&mut vm, PAGE_SIZE).unwrap().unwrap();
    assert!(pool.allocate(&mut vm, PAGE_SIZE).unwrap().is_some());
    assert_eq!(pool.allocate(&mut vm, PAGE_SIZE).unwrap(), None);

    // Adjacent free regions stay separate entries, so their combined size
    // cannot satisfy a single request.
    pool.release(&mut vm, a).unwrap();
    pool.release(&mut vm, b).unwrap();
    assert_eq!(pool.allocate(&mut vm, 2 * PAGE_SIZE).unwrap(), None);

    // Each fragment is individually reusable, first fit in array order.
    assert_eq!(pool.allocate(&mut vm, PAGE_SIZE).unwrap(), Some(a));
    assert_eq!(pool.allocate(&mut vm, PAGE_SIZE).unwrap(), Some(b));
}

#[test]
fn unsatisfiable_requests_are_not_errors() {
    let mut fx = Fixture::new();
    let pool = fx.pool(POOL_SIZE);

    let mut vm = fx.vm();
    assert_eq!(pool.allocate(&mut vm, 0).unwrap(), None);
    assert_eq!(pool.allocate(&mut vm, 2 * POOL_SIZE).unwrap(), None);

    // The pool still works afterwards.
    assert!(pool.allocate(&mut vm, 100).unwrap().is_some());
}

#[test]
fn misaligned_pool_regions_are_rejected() {
    let mut fx = Fixture::new();
    let err = VmPool::new(
        &mut fx.space,
        &mut fx.registry,
        &fx.config,
        &mut fx.machine.ram,
        &mut fx.machine.regs,
        VirtualAddress::new(0x4000_0100),
        POOL_SIZE,
    )
    .unwrap_err();
    assert!(matches!(err, VmemError::InvalidRegion { .. }));

    // Too small to hold bookkeeping plus one page.
    let err = VmPool::new(
        &mut fx.space,
        &mut fx.registry,
        &fx.config,
        &mut fx.machine.ram,
        &mut fx.machine.regs,
        POOL_BASE,
        PAGE_SIZE,
    )
    .unwrap_err();
    assert!(matches!(err, VmemError::InvalidRegion { .. }));
}
