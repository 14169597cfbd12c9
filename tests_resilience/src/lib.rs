//! Resilience Test Utilities
//!
//! This crate provides shared utilities for the filesystem scenario tests.
//!
//! ## Test Philosophy
//!
//! - **Failures are surfaced, never masked**: a failed step is what the caller sees
//! - **Deterministic failures**: all faults are reproducible via `FaultPlan`
//! - **No handle leaks**: every session, archive and file opened is released
//! - **Commit discipline**: save data only changes durably through a commit

use core_types::UserSaveDataLocator;
use fs_api::FsResult;
use services_filesystem::{FsConfig, FsContext};
use sim_fs::test_utils::{standard_service, TEST_SAVE_LOCATOR};
use sim_fs::{MemoryFsService, VolumeKey};

/// Creates a simulated service with the volumes the default config opens
pub fn test_bootstrap() -> MemoryFsService {
    standard_service(TEST_SAVE_LOCATOR)
}

/// Config matching [`test_bootstrap`]
pub fn test_config() -> FsConfig {
    FsConfig::new(TEST_SAVE_LOCATOR)
}

/// Initializes a context borrowing `service`
pub fn init_context(service: &mut MemoryFsService) -> FsResult<FsContext<&mut MemoryFsService>> {
    FsContext::init(service, &test_config())
}

/// Key of the save volume opened by [`test_config`]
pub fn save_volume() -> VolumeKey {
    VolumeKey::user_save_data(test_locator())
}

pub fn test_locator() -> UserSaveDataLocator {
    TEST_SAVE_LOCATOR
}
