//! CLI command implementations.

use offshoot_git::GitError;
use offshoot_storage::{
    Commit, EntryMode, Object, ObjectId, ObjectKind, ObjectStore, Repository, StorageError, Tree,
    TreeEntry,
};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad command usage.
    #[error("{0}")]
    Usage(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Clone or protocol error.
    #[error("{0}")]
    Git(#[from] GitError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Identity used for commits created by `commit-tree`.
const COMMITTER: &str = "Offshoot <offshoot@localhost>";

/// Initialize a new repository.
pub fn init(path: Option<&str>) -> Result<()> {
    let work_dir = Path::new(path.unwrap_or("."));

    tracing::info!(path = %work_dir.display(), "Initializing repository");
    let repo = Repository::init(work_dir)?;

    println!(
        "Initialized empty Offshoot repository in {}",
        repo.git_dir().display()
    );
    Ok(())
}

/// Clone a repository.
pub fn clone(url: &str, dir: Option<&str>) -> Result<()> {
    let target = offshoot_git::clone(url, dir.map(Path::new))?;
    println!("Cloned into {}", target.display());
    Ok(())
}

/// Print an object's content.
pub fn cat_file(pretty: bool, id: &str) -> Result<()> {
    if !pretty {
        return Err(CliError::Usage("cat-file requires -p".to_string()));
    }

    let repo = Repository::open(".")?;
    let object = repo.objects.read(&ObjectId::from_hex(id)?)?;

    let rendered = pretty_object(&object)?;
    std::io::stdout().write_all(&rendered)?;
    Ok(())
}

/// Hash a file as a blob, optionally storing it.
pub fn hash_object(write: bool, file: &str) -> Result<()> {
    let content = std::fs::read(file)?;
    let blob = Object::blob(content);

    if write {
        let repo = Repository::open(".")?;
        repo.objects.put(&blob)?;
    }

    println!("{}", blob.id);
    Ok(())
}

/// List the entries of a tree object.
pub fn ls_tree(name_only: bool, id: &str) -> Result<()> {
    let repo = Repository::open(".")?;
    let object = repo.objects.read(&ObjectId::from_hex(id)?)?;

    if object.kind != ObjectKind::Tree {
        return Err(CliError::Usage(format!(
            "object {id} is a {}, not a tree",
            object.kind
        )));
    }

    let tree = Tree::parse(&object.data)?;
    print!("{}", render_tree(&tree, name_only));
    Ok(())
}

/// Snapshot the working directory into tree objects.
pub fn write_tree() -> Result<()> {
    let repo = Repository::open(".")?;
    let id = snapshot_tree(&repo.objects, repo.work_dir())?;
    println!("{id}");
    Ok(())
}

/// Create a commit object for a tree.
pub fn commit_tree(tree: &str, parent: Option<&str>, message: &str) -> Result<()> {
    let repo = Repository::open(".")?;
    let tree_id = ObjectId::from_hex(tree)?;

    if repo.objects.read(&tree_id)?.kind != ObjectKind::Tree {
        return Err(CliError::Usage(format!("object {tree} is not a tree")));
    }

    let parents = match parent {
        Some(hex) => vec![ObjectId::from_hex(hex)?],
        None => vec![],
    };

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let commit = build_commit(tree_id, parents, message, timestamp);

    let id = repo.objects.write(ObjectKind::Commit, &commit.to_bytes())?;
    println!("{id}");
    Ok(())
}

/// Renders an object the way `cat-file -p` shows it.
fn pretty_object(object: &Object) -> Result<Vec<u8>> {
    match object.kind {
        ObjectKind::Blob | ObjectKind::Commit | ObjectKind::Tag => Ok(object.data.to_vec()),
        ObjectKind::Tree => {
            let tree = Tree::parse(&object.data)?;
            Ok(render_tree(&tree, false).into_bytes())
        }
    }
}

/// Renders tree entries, one per line.
fn render_tree(tree: &Tree, name_only: bool) -> String {
    let mut out = String::new();
    for entry in &tree.entries {
        if name_only {
            out.push_str(&entry.name);
        } else {
            let kind = if entry.mode.is_directory() {
                "tree"
            } else {
                "blob"
            };
            out.push_str(&format!(
                "{:0>6} {} {}\t{}",
                entry.mode.as_str(),
                kind,
                entry.id,
                entry.name
            ));
        }
        out.push('\n');
    }
    out
}

/// Recursively snapshots a directory into tree objects, returning the
/// root tree identity. The `.git` directory is ignored at every level.
fn snapshot_tree(store: &ObjectStore, dir: &Path) -> Result<ObjectId> {
    let mut entries = Vec::new();

    for dir_entry in std::fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if name == ".git" {
            continue;
        }

        let path = dir_entry.path();
        let file_type = dir_entry.file_type()?;

        let (mode, id) = if file_type.is_dir() {
            (EntryMode::Directory, snapshot_tree(store, &path)?)
        } else if file_type.is_symlink() {
            let target = std::fs::read_link(&path)?;
            let bytes = target.to_string_lossy().into_owned().into_bytes();
            (EntryMode::Symlink, store.write(ObjectKind::Blob, &bytes)?)
        } else {
            let content = std::fs::read(&path)?;
            let mode = if is_executable(&dir_entry.metadata()?) {
                EntryMode::Executable
            } else {
                EntryMode::Regular
            };
            (mode, store.write(ObjectKind::Blob, &content)?)
        };

        entries.push(TreeEntry::new(mode, name, id)?);
    }

    let tree = Tree::new(entries);
    Ok(store.write(ObjectKind::Tree, &tree.to_bytes())?)
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    false
}

/// Builds a commit payload with the fixed committer identity.
fn build_commit(tree: ObjectId, parents: Vec<ObjectId>, message: &str, timestamp: u64) -> Commit {
    let identity = format!("{COMMITTER} {timestamp} +0000");
    let mut message = message.to_string();
    if !message.ends_with('\n') {
        message.push('\n');
    }

    Commit {
        tree,
        parents,
        author: identity.clone(),
        committer: identity,
        message,
    }
}
