//! Test utilities
//!
//! Helpers for building a simulated service laid out the way the shim
//! expects: a write-through SD card and one journaled user save-data volume.

use crate::fault_injection::FaultPlan;
use crate::MemoryFsService;
use core_types::{MediaType, UserSaveDataLocator};

/// Save-data locator used by tests that don't care which title they target
pub const TEST_SAVE_LOCATOR: UserSaveDataLocator =
    UserSaveDataLocator::new(MediaType::Sd, 0x2A, 0x00);

/// Creates a service with SD card and save data for `locator`
pub fn standard_service(locator: UserSaveDataLocator) -> MemoryFsService {
    MemoryFsService::new()
        .with_sdmc()
        .with_user_save_data(locator)
}

/// Runs a test against a standard service with a fault plan applied
///
/// # Example
///
/// ```
/// use fs_api::{FsError, FsService};
/// use sim_fs::fault_injection::FaultPlan;
/// use sim_fs::test_utils::with_fault_plan;
/// use sim_fs::RequestKind;
///
/// let plan = FaultPlan::fail_next(RequestKind::Connect, FsError::Io("down".to_string()));
/// with_fault_plan(plan, |service| {
///     assert!(service.connect().is_err());
///     assert!(service.connect().is_ok());
/// });
/// ```
pub fn with_fault_plan<F, R>(plan: FaultPlan, f: F) -> R
where
    F: FnOnce(&mut MemoryFsService) -> R,
{
    let mut service = standard_service(TEST_SAVE_LOCATOR).with_fault_plan(plan);
    f(&mut service)
}
