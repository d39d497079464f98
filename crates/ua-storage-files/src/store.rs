//! Reading and rewriting the account files.
//!
//! Writers take an exclusive advisory lock on `.pwd.lock` in the account
//! directory for the whole read-modify-write, then replace each changed file
//! by writing a temporary file next to it and renaming it into place. Readers
//! take no lock; a rename never exposes a half-written file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use ua_core::config::FilesConfig;
use ua_storage::StorageResult;
use uuid::Uuid;

use crate::layout::Layout;

const LOCK_FILE: &str = ".pwd.lock";

/// The account files of one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
    backup: bool,
}

impl FileStore {
    /// Creates a store over `config.directory`.
    #[must_use]
    pub fn new(config: &FilesConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            backup: config.backup,
        }
    }

    /// Directory holding the files.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Full path of `layout`'s file.
    #[must_use]
    pub fn path(&self, layout: &Layout) -> PathBuf {
        self.directory.join(layout.file)
    }

    /// Reads every line of `layout`'s file. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be read.
    pub fn read(&self, layout: &Layout) -> StorageResult<Vec<String>> {
        match fs::read_to_string(self.path(layout)) {
            Ok(text) => Ok(text.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Locks the directory for writing.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the lock file cannot be created or locked.
    pub fn begin(&self) -> StorageResult<Transaction<'_>> {
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.directory.join(LOCK_FILE))?;
        lock.lock_exclusive()?;
        tracing::trace!(directory = %self.directory.display(), "locked account files");
        Ok(Transaction {
            store: self,
            lock,
            files: Vec::new(),
        })
    }

    fn replace(&self, layout: &Layout, lines: &[String]) -> io::Result<()> {
        let path = self.path(layout);
        if self.backup && path.exists() {
            let backup = self.directory.join(format!("{}-", layout.file));
            fs::copy(&path, &backup)?;
        }

        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        atomic_write(&path, text.as_bytes(), layout.secret)
    }
}

/// Writes `data` to a temporary file beside `path`, then renames it over
/// `path`. Existing permissions are kept; new secret files get mode 0600.
fn atomic_write(path: &Path, data: &[u8], secret: bool) -> io::Result<()> {
    let temp_path = path.with_file_name(format!(
        "{}.tmp.{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("accounts"),
        Uuid::new_v4()
    ));

    let previous = fs::metadata(path).ok().map(|m| m.permissions());

    let result = (|| {
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;

        match previous {
            Some(perms) => fs::set_permissions(&temp_path, perms)?,
            None => set_new_file_mode(&temp_path, secret)?,
        }

        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

#[cfg(unix)]
fn set_new_file_mode(path: &Path, secret: bool) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = if secret { 0o600 } else { 0o644 };
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_new_file_mode(_path: &Path, _secret: bool) -> io::Result<()> {
    Ok(())
}

/// A locked read-modify-write over one or more files.
///
/// Files are loaded on first access and only those whose lines changed are
/// written by [`Transaction::commit`]. Dropping without committing writes
/// nothing.
pub struct Transaction<'a> {
    store: &'a FileStore,
    lock: File,
    files: Vec<(Layout, Vec<String>, Vec<String>)>,
}

impl Transaction<'_> {
    /// Mutable lines of `layout`'s file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn lines(&mut self, layout: &Layout) -> StorageResult<&mut Vec<String>> {
        let index = match self.files.iter().position(|(l, _, _)| l.file == layout.file) {
            Some(i) => i,
            None => {
                let original = self.store.read(layout)?;
                self.files.push((*layout, original.clone(), original));
                self.files.len() - 1
            }
        };
        Ok(&mut self.files[index].2)
    }

    /// Writes every changed file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the first file that could not be replaced.
    /// Files written before it stay written.
    pub fn commit(self) -> StorageResult<()> {
        for (layout, original, lines) in &self.files {
            if original != lines {
                self.store.replace(layout, lines)?;
                tracing::debug!(file = layout.file, "rewrote account file");
            }
        }
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.lock) {
            tracing::warn!(error = %e, "failed to release account file lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{GROUP, PASSWD, SHADOW};

    fn store(dir: &Path, backup: bool) -> FileStore {
        FileStore::new(&FilesConfig {
            directory: dir.to_path_buf(),
            shadow: true,
            backup,
        })
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(dir.path(), true).read(&PASSWD).unwrap().is_empty());
    }

    #[test]
    fn commit_writes_changed_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let files = store(dir.path(), true);
        fs::write(dir.path().join("group"), "wheel:x:10:\n").unwrap();

        let mut tx = files.begin().unwrap();
        tx.lines(&PASSWD)
            .unwrap()
            .push("alice:x:1000:100::/home/alice:/bin/bash".to_string());
        tx.lines(&GROUP).unwrap();
        tx.commit().unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("passwd")).unwrap(),
            "alice:x:1000:100::/home/alice:/bin/bash\n"
        );
        assert!(!dir.path().join("group-").exists());
    }

    #[test]
    fn backup_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let files = store(dir.path(), true);
        fs::write(dir.path().join("passwd"), "root:x:0:0::/root:/bin/sh\n").unwrap();

        let mut tx = files.begin().unwrap();
        tx.lines(&PASSWD).unwrap().clear();
        tx.commit().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("passwd")).unwrap(), "");
        assert_eq!(
            fs::read_to_string(dir.path().join("passwd-")).unwrap(),
            "root:x:0:0::/root:/bin/sh\n"
        );
    }

    #[test]
    fn dropped_transaction_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = store(dir.path(), false);

        {
            let mut tx = files.begin().unwrap();
            tx.lines(&PASSWD).unwrap().push("ghost:x:1:1:::".to_string());
        }

        assert!(!dir.path().join("passwd").exists());
        // The lock was released on drop.
        files.begin().unwrap().commit().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn new_secret_files_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let files = store(dir.path(), false);
        let mut tx = files.begin().unwrap();
        tx.lines(&SHADOW).unwrap().push("alice:!!:::::::".to_string());
        tx.commit().unwrap();

        let mode = fs::metadata(dir.path().join("shadow")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
