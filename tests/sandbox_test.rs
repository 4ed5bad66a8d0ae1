//! Confinement tests
//!
//! Landlock restricts the calling thread and its children only, so each test
//! installs the policy on a dedicated thread and leaves the test harness
//! untouched. Kernels without Landlock ABI v4 report
//! `ConfinementInstallFailed`, which is the expected outcome there.

use bees_exporter::bees::StatusDir;
use bees_exporter::collectors;
use bees_exporter::error::ExporterError;
use bees_exporter::sandbox;
use std::fs;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, TcpListener};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

const STATUS: &str = "TOTAL:\n\tcrawl_done=1\n";

/// Helper to find a currently unused TCP port
fn free_port() -> u16 {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn create_work_dir(path: &Path) {
    fs::create_dir(path).unwrap();
    fs::write(path.join("fs.status"), STATUS).unwrap();
}

/// Installs the policy on the current thread, `false` when the kernel lacks Landlock.
fn confine(dir: &StatusDir, port: u16) -> bool {
    match sandbox::install(dir, port) {
        Ok(()) => true,
        Err(ExporterError::ConfinementInstallFailed(reason)) => {
            eprintln!("Landlock unavailable, skipping: {reason}");
            false
        }
        Err(other) => panic!("Unexpected error: {other:?}"),
    }
}

#[test]
fn test_confined_thread_reads_only_the_work_dir() {
    // Given: A work directory and a file next to it
    let root = tempfile::tempdir().unwrap();
    let work: PathBuf = root.path().join("bees");
    create_work_dir(&work);
    let outside = root.path().join("secret.txt");
    fs::write(&outside, "secret").unwrap();
    let port = free_port();

    let handle = thread::spawn(move || {
        let dir = StatusDir::open(&work).unwrap();
        if !confine(&dir, port) {
            return;
        }

        // Then: Status files are still readable
        assert_eq!(collectors::collect(&dir).len(), 1);

        // Then: Everything else is denied
        assert_eq!(
            fs::read(&outside).unwrap_err().kind(),
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            fs::write(work.join("new.status"), STATUS).unwrap_err().kind(),
            ErrorKind::PermissionDenied
        );
    });

    handle.join().unwrap();
}

#[test]
fn test_confined_thread_cannot_bind_other_ports() {
    let root = tempfile::tempdir().unwrap();
    let work = root.path().join("bees");
    create_work_dir(&work);
    let allowed = free_port();
    let denied = loop {
        let port = free_port();
        if port != allowed {
            break port;
        }
    };

    let handle = thread::spawn(move || {
        let dir = StatusDir::open(&work).unwrap();
        if !confine(&dir, allowed) {
            return;
        }

        let err = TcpListener::bind((Ipv4Addr::LOCALHOST, denied)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(TcpListener::bind((Ipv4Addr::LOCALHOST, allowed)).is_ok());
    });

    handle.join().unwrap();
}

#[test]
fn test_recreated_work_dir_is_outside_the_policy() {
    // Given: A confined thread holding the original work directory
    let root = tempfile::tempdir().unwrap();
    let work = root.path().join("bees");
    create_work_dir(&work);
    let port = free_port();

    let (confined_tx, confined_rx) = mpsc::channel();
    let (recreated_tx, recreated_rx) = mpsc::channel();

    let thread_work = work.clone();
    let handle = thread::spawn(move || {
        let dir = StatusDir::open(&thread_work).unwrap();
        let confined = confine(&dir, port);
        confined_tx.send(confined).unwrap();
        if !confined {
            return;
        }
        assert_eq!(collectors::collect(&dir).len(), 1);

        recreated_rx.recv().unwrap();

        // Then: The new directory at the same path is not reachable
        assert_eq!(
            fs::read_dir(&thread_work).unwrap_err().kind(),
            ErrorKind::PermissionDenied
        );
        assert!(collectors::collect(&dir).is_empty());
    });

    // When: The directory is removed and created again by an unconfined thread
    if let Ok(true) = confined_rx.recv() {
        fs::remove_dir_all(&work).unwrap();
        create_work_dir(&work);
        let _ = recreated_tx.send(());
    }

    handle.join().unwrap();
}
