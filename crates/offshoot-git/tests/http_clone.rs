//! End-to-end clone against an in-process HTTP remote.
//!
//! A small axum server plays the remote: it serves a canned ref
//! advertisement and a canned upload-pack response for a repository
//! holding a single commit whose tree is `{README: "hi\n"}`.

use axum::http::header;
use axum::routing::{get, post};
use axum::Router;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use offshoot_git::GitError;
use offshoot_storage::{Commit, EntryMode, ObjectId, ObjectKind, Tree, TreeEntry};
use sha1::{Digest, Sha1};
use std::io::Write;
use std::net::SocketAddr;
use tempfile::TempDir;

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn pkt_line(payload: &[u8]) -> Vec<u8> {
    let mut out = format!("{:04x}", payload.len() + 4).into_bytes();
    out.extend_from_slice(payload);
    out
}

fn pack_entry(type_code: u8, payload: &[u8]) -> Vec<u8> {
    let size = payload.len();
    let mut first = (type_code << 4) | ((size & 0x0f) as u8);
    let mut remaining = size >> 4;
    let mut entry = Vec::new();
    if remaining > 0 {
        first |= 0x80;
    }
    entry.push(first);
    while remaining > 0 {
        let mut byte = (remaining & 0x7f) as u8;
        remaining >>= 7;
        if remaining > 0 {
            byte |= 0x80;
        }
        entry.push(byte);
    }
    entry.extend(zlib(payload));
    entry
}

/// Canned bytes for the fixture repository.
fn fixture_bytes() -> (Vec<u8>, Vec<u8>, ObjectId) {
    let readme = b"hi\n";
    let blob_id = ObjectId::hash_object(ObjectKind::Blob, readme);

    let tree = Tree::new(vec![
        TreeEntry::new(EntryMode::Regular, "README", blob_id).unwrap()
    ]);
    let tree_bytes = tree.to_bytes();
    let tree_id = ObjectId::hash_object(ObjectKind::Tree, &tree_bytes);

    let commit = Commit {
        tree: tree_id,
        parents: vec![],
        author: "Remote <remote@example.com> 1700000000 +0000".to_string(),
        committer: "Remote <remote@example.com> 1700000000 +0000".to_string(),
        message: "first\n".to_string(),
    };
    let commit_bytes = commit.to_bytes();
    let commit_id = ObjectId::hash_object(ObjectKind::Commit, &commit_bytes);

    let mut advertisement = Vec::new();
    advertisement.extend(pkt_line(b"# service=git-upload-pack\n"));
    advertisement.extend_from_slice(b"0000");
    advertisement.extend(pkt_line(
        format!("{commit_id} HEAD\0side-band-64k symref=HEAD:refs/heads/main agent=fixture\n")
            .as_bytes(),
    ));
    advertisement.extend(pkt_line(
        format!("{commit_id} refs/heads/main\n").as_bytes(),
    ));
    advertisement.extend_from_slice(b"0000");

    let mut pack = Vec::new();
    pack.extend_from_slice(b"PACK");
    pack.extend_from_slice(&2u32.to_be_bytes());
    pack.extend_from_slice(&3u32.to_be_bytes());
    pack.extend(pack_entry(1, &commit_bytes));
    pack.extend(pack_entry(2, &tree_bytes));
    pack.extend(pack_entry(3, readme));
    let mut hasher = Sha1::new();
    hasher.update(&pack);
    let digest = hasher.finalize();
    pack.extend_from_slice(&digest);

    let mut response = Vec::new();
    response.extend(pkt_line(b"NAK\n"));
    for chunk in pack.chunks(8192) {
        let mut framed = vec![1u8];
        framed.extend_from_slice(chunk);
        response.extend(pkt_line(&framed));
    }
    response.extend(pkt_line(b"\x02Total 3 (delta 0), reused 0\r"));
    response.extend_from_slice(b"0000");

    (advertisement, response, commit_id)
}

/// Spawns the fixture remote on a background thread, returning its address.
fn spawn_remote(advertisement: Vec<u8>, response: Vec<u8>) -> SocketAddr {
    let (tx, rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let app = Router::new()
                .route(
                    "/repo.git/info/refs",
                    get(move || {
                        let body = advertisement.clone();
                        async move {
                            (
                                [(
                                    header::CONTENT_TYPE,
                                    "application/x-git-upload-pack-advertisement",
                                )],
                                body,
                            )
                        }
                    }),
                )
                .route(
                    "/repo.git/git-upload-pack",
                    post(move || {
                        let body = response.clone();
                        async move {
                            (
                                [(
                                    header::CONTENT_TYPE,
                                    "application/x-git-upload-pack-result",
                                )],
                                body,
                            )
                        }
                    }),
                );

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    rx.recv().unwrap()
}

#[test]
fn test_clone_over_http() {
    let (advertisement, response, commit_id) = fixture_bytes();
    let addr = spawn_remote(advertisement, response);
    let url = format!("http://{addr}/repo.git");

    let temp = TempDir::new().unwrap();
    let target = temp.path().join("r");

    offshoot_git::clone(&url, Some(&target)).unwrap();

    assert_eq!(std::fs::read(target.join("README")).unwrap(), b"hi\n");
    assert_eq!(
        std::fs::read_to_string(target.join(".git/HEAD")).unwrap(),
        "ref: refs/heads/main\n"
    );
    assert_eq!(
        std::fs::read_to_string(target.join(".git/refs/heads/main")).unwrap(),
        format!("{commit_id}\n")
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(target.join("README"))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o644);
    }
}

#[test]
fn test_clone_derives_target_from_url() {
    let (advertisement, response, _) = fixture_bytes();
    let addr = spawn_remote(advertisement, response);
    let url = format!("http://{addr}/repo.git");

    // The derived name feeds the target path under a scratch directory.
    let derived = offshoot_git::target_dir_from_url(&url).unwrap();
    assert_eq!(derived, "repo");

    let temp = TempDir::new().unwrap();
    let target = temp.path().join(derived);

    offshoot_git::clone(&url, Some(&target)).unwrap();
    assert!(target.join("README").is_file());
}

#[test]
fn test_clone_from_missing_remote_path_fails() {
    let (advertisement, response, _) = fixture_bytes();
    let addr = spawn_remote(advertisement, response);
    // Wrong repository path: the server answers 404.
    let url = format!("http://{addr}/other.git");

    let temp = TempDir::new().unwrap();
    let target = temp.path().join("r");

    let err = offshoot_git::clone(&url, Some(&target)).unwrap_err();
    assert!(matches!(err, GitError::Transport(_)));
}
