//! Repository behaviour under concurrent access and with arbitrary content.

use depot_coordinate::{parse_coordinate, Coordinate};
use depot_store::{Repository, Retrieval};
use std::sync::Arc;
use std::thread;

fn repo() -> (tempfile::TempDir, Arc<Repository>) {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(Repository::new(dir.path().join("repository")));
    (dir, repo)
}

fn coordinate(path: &str) -> Coordinate {
    parse_coordinate(path).unwrap()
}

fn fetch(repo: &Repository, c: &Coordinate) -> Vec<u8> {
    let mut out = Vec::new();
    assert_eq!(repo.retrieve(c, Some(&mut out)).unwrap(), Retrieval::Found);
    out
}

#[test]
fn zero_length_artifact_roundtrip() {
    let (_dir, repo) = repo();
    let c = coordinate("org/empty/1.0/empty-1.0.jar");
    assert_eq!(repo.store(&c, &mut &b""[..]).unwrap(), 0);
    assert!(repo.exists(&c).unwrap());
    assert!(fetch(&repo, &c).is_empty());
}

#[test]
fn non_utf8_artifact_roundtrip() {
    let (_dir, repo) = repo();
    let c = coordinate("org/bin/2.0/bin-2.0.so");
    let data: Vec<u8> = (0..=255u8).rev().cycle().take(4096).collect();
    repo.store(&c, &mut data.as_slice()).unwrap();
    assert_eq!(fetch(&repo, &c), data);
}

#[test]
fn large_artifact_roundtrip() {
    let (_dir, repo) = repo();
    let c = coordinate("org/big/1.0/big-1.0.tar");
    let data: Vec<u8> = (0..3_000_000u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(
        repo.store(&c, &mut data.as_slice()).unwrap(),
        data.len() as u64
    );
    assert_eq!(fetch(&repo, &c), data);
}

#[test]
fn repeated_identical_store_is_idempotent() {
    let (_dir, repo) = repo();
    let c = coordinate("org/a/1.0/a-1.0.pom");
    let pom = b"<project><artifactId>a</artifactId></project>";
    repo.store(&c, &mut &pom[..]).unwrap();
    repo.store(&c, &mut &pom[..]).unwrap();
    assert_eq!(fetch(&repo, &c), pom);
}

#[test]
fn versions_and_metadata_coexist() {
    let (_dir, repo) = repo();
    let v1 = coordinate("org/lib/1.0/lib-1.0.jar");
    let v2 = coordinate("org/lib/2.0/lib-2.0.jar");
    let meta = coordinate("org/lib/maven-metadata.xml");
    repo.store(&v1, &mut &b"one"[..]).unwrap();
    repo.store(&v2, &mut &b"two"[..]).unwrap();
    repo.store(&meta, &mut &b"<metadata/>"[..]).unwrap();

    assert_eq!(fetch(&repo, &v1), b"one");
    assert_eq!(fetch(&repo, &v2), b"two");
    assert_eq!(fetch(&repo, &meta), b"<metadata/>");
}

#[test]
fn survives_reopening_the_repository() {
    let dir = tempfile::tempdir().unwrap();
    let c = coordinate("org/persist/1.0/persist-1.0.jar");
    {
        let repo = Repository::new(dir.path());
        repo.store(&c, &mut &b"kept"[..]).unwrap();
    }
    let repo = Repository::new(dir.path());
    assert_eq!(fetch(&repo, &c), b"kept");
}

#[test]
fn concurrent_readers_see_full_content() {
    let (_dir, repo) = repo();
    let c = coordinate("org/shared/1.0/shared-1.0.jar");
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 7) as u8).collect();
    repo.store(&c, &mut data.as_slice()).unwrap();
    let data = Arc::new(data);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let data = Arc::clone(&data);
            let c = c.clone();
            thread::spawn(move || {
                for _ in 0..5 {
                    assert_eq!(fetch(&repo, &c), *data);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn concurrent_writers_to_one_coordinate_leave_one_complete_version() {
    let (_dir, repo) = repo();
    let c = coordinate("org/race/1.0/race-1.0.jar");
    let payloads: Vec<Vec<u8>> = (0..6u8).map(|i| vec![i; 64 * 1024]).collect();

    let handles: Vec<_> = payloads
        .iter()
        .cloned()
        .map(|payload| {
            let repo = Arc::clone(&repo);
            let c = c.clone();
            thread::spawn(move || {
                repo.store(&c, &mut payload.as_slice()).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stored = fetch(&repo, &c);
    assert!(
        payloads.contains(&stored),
        "stored content must be exactly one writer's payload"
    );
}

#[test]
fn concurrent_reader_never_observes_partial_write() {
    let (_dir, repo) = repo();
    let c = coordinate("org/swap/1.0/swap-1.0.bin");
    let a = vec![b'a'; 256 * 1024];
    let b = vec![b'b'; 256 * 1024];
    repo.store(&c, &mut a.as_slice()).unwrap();

    let writer = {
        let repo = Arc::clone(&repo);
        let c = c.clone();
        let (a, b) = (a.clone(), b.clone());
        thread::spawn(move || {
            for i in 0..20 {
                let payload = if i % 2 == 0 { &b } else { &a };
                repo.store(&c, &mut payload.as_slice()).unwrap();
            }
        })
    };

    for _ in 0..20 {
        let seen = fetch(&repo, &c);
        assert!(seen == a || seen == b, "reader saw a torn file");
    }
    writer.join().unwrap();
}

#[test]
fn concurrent_stores_share_intermediate_directories() {
    let (_dir, repo) = repo();
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                let c = coordinate(&format!("org/example/lib/1.{i}/lib-1.{i}.jar"));
                repo.store(&c, &mut format!("v{i}").as_bytes()).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for i in 0..16 {
        let c = coordinate(&format!("org/example/lib/1.{i}/lib-1.{i}.jar"));
        assert_eq!(fetch(&repo, &c), format!("v{i}").as_bytes());
    }
}
