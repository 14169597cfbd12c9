//! Archive Consistency Tests
//!
//! Validates that commits happen only after successful changes and that
//! failed requests leave archives untouched.

use core_types::FsPath;
use fs_api::FsError;
use sim_fs::{FaultPlan, RequestKind, VolumeKey};
use tests_resilience::{init_context, save_volume, test_bootstrap};

fn path(p: &str) -> FsPath {
    FsPath::parse(p).expect("bad path")
}

/// Test: a failed write is never committed
///
/// The write error is returned verbatim and no control request is issued.
#[test]
fn test_write_s_file_skips_commit_on_write_failure() {
    let mut service = test_bootstrap().with_fault_plan(FaultPlan::fail_next(
        RequestKind::Write,
        FsError::NoSpace,
    ));
    let mut fs = init_context(&mut service).expect("init failed");
    let save = fs.save();

    let result = fs.write_s_file("/save.dat", &[1u8; 100], 100, save);
    assert_eq!(result, Err(FsError::NoSpace));
    fs.exit().expect("exit failed");

    assert_eq!(service.audit().count(RequestKind::ControlArchive), 0);
    assert_eq!(service.audit().count(RequestKind::CloseFile), 1);
}

/// Test: a failed open is never committed either
#[test]
fn test_write_s_file_skips_commit_on_open_failure() {
    let mut service = test_bootstrap().with_fault_plan(FaultPlan::fail_next(
        RequestKind::OpenFile,
        FsError::PermissionDenied("locked".to_string()),
    ));
    let mut fs = init_context(&mut service).expect("init failed");
    let save = fs.save();

    let result = fs.write_s_file("/save.dat", b"abc", 3, save);
    assert_eq!(result, Err(FsError::PermissionDenied("locked".to_string())));
    fs.exit().expect("exit failed");

    assert_eq!(service.audit().count(RequestKind::ControlArchive), 0);
    assert_eq!(service.audit().count(RequestKind::CloseFile), 0);
}

/// Test: a successful write_s_file commits exactly once, after the close
#[test]
fn test_write_s_file_commits_after_close() {
    let mut service = test_bootstrap();
    let mut fs = init_context(&mut service).expect("init failed");
    let save = fs.save();

    fs.write_s_file("/save.dat", b"abc", 3, save)
        .expect("write failed");
    fs.exit().expect("exit failed");

    let kinds = service.audit().kinds();
    let close = kinds
        .iter()
        .position(|k| *k == RequestKind::CloseFile)
        .expect("no close");
    let commit = kinds
        .iter()
        .position(|k| *k == RequestKind::ControlArchive)
        .expect("no commit");
    assert!(close < commit);
    assert_eq!(service.audit().count(RequestKind::ControlArchive), 1);
}

/// Test: uncommitted save changes are discarded at exit
#[test]
fn test_uncommitted_save_changes_vanish() {
    let mut service = test_bootstrap();
    let mut fs = init_context(&mut service).expect("init failed");
    let save = fs.save();

    fs.write_file("/draft.sav", b"draft", 5, save)
        .expect("write failed");
    fs.write_s_file("/final.sav", b"final", 5, save)
        .expect("write failed");
    fs.write_file("/late.sav", b"late", 4, save)
        .expect("write failed");
    fs.exit().expect("exit failed");

    let volume = service.volume(&save_volume()).expect("no save volume");
    // The commit published everything written before it
    assert_eq!(volume.file(&path("/draft.sav")), Some(&b"draft"[..]));
    assert_eq!(volume.file(&path("/final.sav")), Some(&b"final"[..]));
    assert_eq!(volume.file(&path("/late.sav")), None);
}

/// Test: deleting a missing file is NotFound and changes nothing
#[test]
fn test_delete_missing_file_leaves_archive_unchanged() {
    let mut service = test_bootstrap();
    service
        .seed_file(&save_volume(), "/keep.sav", b"keep")
        .expect("seed failed");
    let mut fs = init_context(&mut service).expect("init failed");
    let save = fs.save();

    let result = fs.delete_file("/ghost.sav", save);
    assert!(matches!(result, Err(FsError::NotFound(_))));
    let result = fs.delete_s_file("/ghost.sav", save);
    assert!(matches!(result, Err(FsError::NotFound(_))));
    fs.exit().expect("exit failed");

    let volume = service.volume(&save_volume()).expect("no save volume");
    assert_eq!(volume.entry_count(), 1);
    assert_eq!(volume.file(&path("/keep.sav")), Some(&b"keep"[..]));
    assert_eq!(service.audit().count(RequestKind::ControlArchive), 0);
}

/// Test: plain delete on a journaled archive is undone without a commit
#[test]
fn test_delete_without_commit_is_discarded() {
    let mut service = test_bootstrap();
    service
        .seed_file(&save_volume(), "/keep.sav", b"keep")
        .expect("seed failed");
    let mut fs = init_context(&mut service).expect("init failed");
    let save = fs.save();

    fs.delete_file("/keep.sav", save).expect("delete failed");
    fs.exit().expect("exit failed");

    let volume = service.volume(&save_volume()).expect("no save volume");
    assert_eq!(volume.file(&path("/keep.sav")), Some(&b"keep"[..]));
}

/// Test: create_directory is non-recursive and refuses duplicates
#[test]
fn test_create_directory_semantics() {
    let mut service = test_bootstrap();
    let mut fs = init_context(&mut service).expect("init failed");
    let sdmc = fs.sdmc();

    fs.create_directory("/saves", sdmc).expect("mkdir failed");
    assert!(matches!(
        fs.create_directory("/saves", sdmc),
        Err(FsError::AlreadyExists(_))
    ));
    assert!(matches!(
        fs.create_directory("/missing/child", sdmc),
        Err(FsError::NotFound(_))
    ));
    fs.exit().expect("exit failed");

    let volume = service.volume(&VolumeKey::sdmc()).expect("no sdmc");
    assert_eq!(volume.entry_count(), 1);
}

/// Test: a full archive reports NoSpace and keeps the previous contents
#[test]
fn test_no_space_is_surfaced() {
    let mut service = sim_fs::MemoryFsService::new()
        .with_volume(
            VolumeKey::sdmc(),
            sim_fs::VolumeConfig::plain().with_capacity(8),
        )
        .with_user_save_data(tests_resilience::test_locator());
    let mut fs = init_context(&mut service).expect("init failed");
    let sdmc = fs.sdmc();

    fs.write_file("/a.bin", b"12345678", 8, sdmc)
        .expect("write failed");
    let result = fs.write_file("/b.bin", b"9", 1, sdmc);
    assert_eq!(result, Err(FsError::NoSpace));
    fs.exit().expect("exit failed");
}

/// Test: read-only archives refuse every mutation
#[test]
fn test_read_only_archive() {
    let mut service = sim_fs::MemoryFsService::new()
        .with_volume(
            VolumeKey::sdmc(),
            sim_fs::VolumeConfig::plain().read_only(),
        )
        .with_user_save_data(tests_resilience::test_locator());
    service
        .seed_file(&VolumeKey::sdmc(), "/rom.bin", b"rom")
        .expect("seed failed");
    let mut fs = init_context(&mut service).expect("init failed");
    let sdmc = fs.sdmc();

    assert!(matches!(
        fs.write_file("/new.bin", b"x", 1, sdmc),
        Err(FsError::PermissionDenied(_))
    ));
    assert!(matches!(
        fs.delete_file("/rom.bin", sdmc),
        Err(FsError::PermissionDenied(_))
    ));
    assert!(matches!(
        fs.create_directory("/d", sdmc),
        Err(FsError::PermissionDenied(_))
    ));

    let mut buf = [0u8; 3];
    assert_eq!(fs.read_file("/rom.bin", &mut buf, sdmc, 3), Ok(3));
    fs.exit().expect("exit failed");
}
