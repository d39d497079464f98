//! Home directories and the login shell list.
//!
//! Copies never follow symbolic links and skip device files, fifos and
//! sockets. Ownership changes the process is not permitted to make are
//! skipped, so an unprivileged caller still ends up with a complete tree.

use std::fs::{self, File, Metadata, OpenOptions};
use std::io;
use std::os::unix::fs::{chown, lchown, symlink, MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ua_core::{Error, Result};
use walkdir::WalkDir;

/// Shells reported when the shells file does not exist.
pub const FALLBACK_SHELLS: [&str; 2] = ["/bin/sh", "/bin/csh"];

/// Ownership given to a copied tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    /// Owner of every copied file.
    pub uid: u32,
    /// Group of the top directory and of files whose source has group 0.
    pub gid: u32,
}

/// An I/O failure and the path it happened on.
#[derive(Debug)]
struct Failure {
    path: PathBuf,
    source: io::Error,
}

impl Failure {
    fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<Failure> for Error {
    fn from(f: Failure) -> Self {
        Self::home_directory(f.path, f.source.to_string())
    }
}

trait At<T> {
    fn at(self, path: &Path) -> std::result::Result<T, Failure>;
}

impl<T> At<T> for io::Result<T> {
    fn at(self, path: &Path) -> std::result::Result<T, Failure> {
        self.map_err(|source| Failure::new(path, source))
    }
}

type Step = std::result::Result<(), Failure>;

/// Creates `home` as a copy of `skeleton`.
///
/// The top directory gets `mode`; copied entries keep the skeleton's modes.
/// Files already present at the destination are left as they are.
///
/// # Errors
///
/// Returns [`Error::HomeDirectory`] when `home` is relative, the skeleton
/// cannot be read, or anything cannot be written.
pub fn populate(skeleton: &Path, home: &Path, owner: Owner, mode: u32) -> Result<()> {
    if !home.is_absolute() {
        return Err(Error::home_directory(home, "path is not absolute"));
    }
    copy_tree(skeleton, home, owner, mode)?;
    tracing::info!(home = %home.display(), skeleton = %skeleton.display(), uid = owner.uid, "created home directory");
    Ok(())
}

/// Moves the tree at `old` to `new`.
///
/// A plain rename is tried first. When that fails, for example across file
/// systems, the tree is copied with the old directory's owner and mode and
/// the original is removed.
///
/// # Errors
///
/// Returns [`Error::HomeDirectory`] when `old` does not exist, `new` is
/// relative, or the copy or removal fails.
pub fn relocate(old: &Path, new: &Path) -> Result<()> {
    if !new.is_absolute() {
        return Err(Error::home_directory(new, "path is not absolute"));
    }
    let meta = fs::metadata(old).at(old)?;
    if !meta.is_dir() {
        return Err(Error::home_directory(old, "not a directory"));
    }

    match fs::rename(old, new) {
        Ok(()) => {
            tracing::info!(old = %old.display(), new = %new.display(), "renamed home directory");
            return Ok(());
        }
        Err(e) => tracing::debug!(error = %e, "rename failed, copying instead"),
    }

    let owner = Owner {
        uid: meta.uid(),
        gid: meta.gid(),
    };
    copy_tree(old, new, owner, meta.mode())?;
    remove(old)?;
    tracing::info!(old = %old.display(), new = %new.display(), "moved home directory");
    Ok(())
}

/// Removes the tree at `home`. Symbolic links inside are removed, not
/// followed.
///
/// # Errors
///
/// Returns [`Error::HomeDirectory`] when `home` is missing, is not a
/// directory, or cannot be removed completely.
pub fn remove(home: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(home).at(home)?;
    if !meta.is_dir() {
        return Err(Error::home_directory(home, "not a directory"));
    }
    fs::remove_dir_all(home).at(home)?;
    tracing::info!(home = %home.display(), "removed home directory");
    Ok(())
}

/// Login shells listed in `path`.
///
/// Each line contributes the first word starting with `/`; comments and
/// lines without one are skipped. A missing file yields
/// [`FALLBACK_SHELLS`].
///
/// # Errors
///
/// Returns [`Error::Config`] when the file exists but cannot be read.
pub fn login_shells(path: &Path) -> Result<Vec<String>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no shells file, using the built-in list");
            return Ok(FALLBACK_SHELLS.iter().map(|s| (*s).to_string()).collect());
        }
        Err(e) => return Err(Error::config(format!("cannot read {}: {e}", path.display()))),
    };
    Ok(text.lines().filter_map(shell_on_line).map(str::to_string).collect())
}

fn shell_on_line(line: &str) -> Option<&str> {
    let start = line.find(['#', '/'])?;
    let rest = &line[start..];
    if rest.starts_with('#') {
        return None;
    }
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '#')
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

// ============================================================================
// Copying
// ============================================================================

fn copy_tree(src: &Path, dest: &Path, owner: Owner, mode: u32) -> Step {
    let top = fs::metadata(src).at(src)?;
    if !top.is_dir() {
        let source = io::Error::new(io::ErrorKind::InvalidInput, "not a directory");
        return Err(Failure::new(src, source));
    }
    make_dir(dest, owner.uid, owner.gid, mode)?;

    let mut directories: Vec<(PathBuf, Option<SystemTime>)> = Vec::new();
    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            Failure::new(&path, e.into())
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);
        let meta = entry
            .metadata()
            .map_err(|e| Failure::new(entry.path(), e.into()))?;
        let gid = if meta.gid() == 0 { owner.gid } else { meta.gid() };

        let kind = entry.file_type();
        if kind.is_dir() {
            make_dir(&target, owner.uid, gid, meta.mode())?;
            directories.push((target, meta.modified().ok()));
        } else if kind.is_symlink() {
            copy_link(entry.path(), &target, owner.uid, gid)?;
        } else if kind.is_file() {
            copy_file(entry.path(), &target, owner.uid, gid, &meta)?;
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping special file");
        }
    }

    // Children touch their parent's mtime, so deepest directories go first.
    for (directory, modified) in directories.into_iter().rev() {
        if let Some(modified) = modified {
            keep_mtime(&directory, modified);
        }
    }
    Ok(())
}

fn make_dir(path: &Path, uid: u32, gid: u32, mode: u32) -> Step {
    match fs::create_dir(path) {
        Err(e) if e.kind() != io::ErrorKind::AlreadyExists => return Err(Failure::new(path, e)),
        _ => {}
    }
    permitted(chown(path, Some(uid), Some(gid)), path)?;
    // After chown, which may clear set-id bits.
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)).at(path)
}

fn copy_link(src: &Path, dest: &Path, uid: u32, gid: u32) -> Step {
    let target = fs::read_link(src).at(src)?;
    match symlink(&target, dest) {
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(()),
        other => other.at(dest)?,
    }
    permitted(lchown(dest, Some(uid), Some(gid)), dest)
}

fn copy_file(src: &Path, dest: &Path, uid: u32, gid: u32, meta: &Metadata) -> Step {
    let mut input = File::open(src).at(src)?;
    let mut output = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(meta.mode() & 0o7777)
        .open(dest)
    {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(()),
        Err(e) => return Err(Failure::new(dest, e)),
    };
    io::copy(&mut input, &mut output).at(dest)?;
    permitted(chown(dest, Some(uid), Some(gid)), dest)?;
    if let Ok(modified) = meta.modified() {
        if let Err(e) = output.set_modified(modified) {
            tracing::debug!(path = %dest.display(), error = %e, "could not keep modification time");
        }
    }
    Ok(())
}

fn keep_mtime(path: &Path, modified: SystemTime) {
    if let Err(e) = File::open(path).and_then(|dir| dir.set_modified(modified)) {
        tracing::debug!(path = %path.display(), error = %e, "could not keep modification time");
    }
}

/// Treats a refused ownership change as done.
fn permitted(result: io::Result<()>, path: &Path) -> Step {
    match result {
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::PermissionDenied | io::ErrorKind::Unsupported
            ) =>
        {
            tracing::debug!(path = %path.display(), "ownership left unchanged");
            Ok(())
        }
        other => other.at(path),
    }
}
