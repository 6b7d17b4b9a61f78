//! Lock triplet I/O.
//!
//! Format of `lock` and `pid`: ASCII decimal PID, optional trailing newline.
//! Format of `state`: JSON object `{pid, port, start_time, cmdline}`.
//!
//! `lock` is created with exclusive-create semantics and is the only file
//! that arbitrates between racing orchestrators. The mirrors are written
//! after it (temp file + rename) and removed before it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, SystemTime};

use orchd_core::domain::StateRecord;
use orchd_core::paths::{LockPaths, ensure_lock_dir};
use thiserror::Error;
use tracing::{debug, warn};

/// Longest PID file we are willing to parse. Decimal u32 plus newline fits.
const PID_BUF_LEN: usize = 16;

/// Errors from lock triplet operations.
#[derive(Debug, Error)]
pub enum StateFileError {
    /// Exclusive create lost: somebody else holds `lock`.
    #[error("Lock file {0} already exists")]
    AlreadyExists(PathBuf),

    /// Reading or writing the lock directory failed.
    #[error("Lock file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StateFileError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The on-disk lock triplet for one port.
#[derive(Debug, Clone)]
pub struct StateFiles {
    paths: LockPaths,
}

impl StateFiles {
    pub const fn new(paths: LockPaths) -> Self {
        Self { paths }
    }

    pub fn for_port(dir: &Path, port: u16) -> Self {
        Self::new(LockPaths::for_port(dir, port))
    }

    pub const fn paths(&self) -> &LockPaths {
        &self.paths
    }

    /// Claim the triplet for `owner_pid`.
    ///
    /// # Atomicity
    /// 1. Create `lock` with `O_CREAT | O_EXCL` (fails if present)
    /// 2. Write the decimal PID into it
    /// 3. Best-effort write of the `state` and `pid` mirrors
    ///
    /// Mirror failures are logged and do not fail the claim.
    pub fn create(&self, owner_pid: u32, port: u16, cmdline: &str) -> Result<(), StateFileError> {
        let lock = &self.paths.lock;
        if let Some(dir) = self.paths.dir() {
            ensure_lock_dir(dir).map_err(|e| StateFileError::io(dir, io::Error::other(e)))?;
        }

        let mut file = match exclusive_open(lock) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StateFileError::AlreadyExists(lock.clone()));
            }
            Err(e) => return Err(StateFileError::io(lock, e)),
        };

        if let Err(e) = writeln!(file, "{owner_pid}").and_then(|()| file.sync_all()) {
            // An empty lock would block everyone until swept; give it back
            drop(file);
            if let Err(cleanup) = fs::remove_file(lock) {
                warn!(path = %lock.display(), error = %cleanup, "Failed to remove half-written lock");
            }
            return Err(StateFileError::io(lock, e));
        }

        let record = StateRecord::now(owner_pid, port, cmdline);
        if let Err(e) = write_state_mirror(&self.paths.state, &record) {
            warn!(path = %self.paths.state.display(), error = %e, "Failed to write state mirror");
        }
        if let Err(e) = write_atomic(&self.paths.pid, format!("{owner_pid}\n").as_bytes()) {
            warn!(path = %self.paths.pid.display(), error = %e, "Failed to write pid mirror");
        }

        Ok(())
    }

    /// PID recorded in `lock`. Missing or malformed content yields `None`.
    ///
    /// Reads into a stack buffer so it stays usable from exit paths.
    pub fn read_owner(&self) -> Option<u32> {
        read_pid_file(&self.paths.lock)
    }

    /// PID recorded in the `pid` mirror.
    pub fn read_pid_mirror(&self) -> Option<u32> {
        read_pid_file(&self.paths.pid)
    }

    /// Time since `lock` was last modified. `None` if it is missing.
    pub fn lock_age(&self) -> Option<Duration> {
        let modified = fs::metadata(&self.paths.lock).ok()?.modified().ok()?;
        // Clock skew reads as a brand new file
        Some(SystemTime::now().duration_since(modified).unwrap_or_default())
    }

    /// Identity of the file currently at `lock`. `None` if it is missing.
    pub fn lock_stamp(&self) -> Option<LockStamp> {
        fs::metadata(&self.paths.lock).ok().map(|meta| LockStamp::of(&meta))
    }

    /// Parsed `state` mirror. Missing or malformed JSON yields `None`.
    pub fn read_state(&self) -> Option<StateRecord> {
        let content = fs::read_to_string(&self.paths.state).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Delete the whole triplet, but only if `lock` names `pid` as owner.
    ///
    /// A different owner, or no lock at all, leaves everything untouched and
    /// succeeds. Missing mirrors are ignored. Mirrors go first, `lock` last.
    pub fn delete_if_owned_by(&self, pid: u32) -> Result<(), StateFileError> {
        if self.read_owner() != Some(pid) {
            return Ok(());
        }
        self.remove_in_teardown_order()
    }

    /// Remove every triplet file that exists, regardless of owner.
    ///
    /// Reserved for stale cleanup.
    pub fn force_remove(&self) -> Result<(), StateFileError> {
        self.remove_in_teardown_order()
    }

    /// Remove `lock` only if it is still the file judged stale.
    ///
    /// The file is first renamed to a name private to this process, then
    /// checked against `judged` (taken before its content was read) and
    /// against `expected` (the PID read then, `None` if malformed). Anything
    /// else is a lock a racer created in the meantime and is linked back.
    /// Returns whether a stale lock was removed.
    ///
    /// If the link back fails, a third claimant created `lock` in between;
    /// that lock stands and the displaced one is dropped.
    pub fn remove_lock_if_stale(
        &self,
        expected: Option<u32>,
        judged: LockStamp,
    ) -> Result<bool, StateFileError> {
        let lock = &self.paths.lock;
        let mut grabbed_name = lock.file_name().unwrap_or_default().to_os_string();
        grabbed_name.push(format!(".stale-{}", process::id()));
        let grabbed = lock.with_file_name(grabbed_name);

        match fs::rename(lock, &grabbed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StateFileError::io(lock, e)),
        }

        let stamp = fs::metadata(&grabbed).ok().map(|meta| LockStamp::of(&meta));
        let actual = read_pid_file(&grabbed);
        if stamp != Some(judged) || actual != expected {
            debug!(path = %lock.display(), ?expected, ?actual, "Lock replaced during sweep, restoring");
            // hard_link fails if a new lock appeared meanwhile; that one wins
            if let Err(e) = fs::hard_link(&grabbed, lock) {
                warn!(path = %lock.display(), error = %e, "Could not restore lock taken during sweep");
            }
            remove_if_exists(&grabbed).map_err(|e| StateFileError::io(&grabbed, e))?;
            return Ok(false);
        }

        remove_if_exists(&grabbed).map_err(|e| StateFileError::io(&grabbed, e))?;
        Ok(true)
    }

    fn remove_in_teardown_order(&self) -> Result<(), StateFileError> {
        let mut first_error = None;
        for path in self.paths.teardown_order() {
            if let Err(e) = remove_if_exists(path) {
                first_error.get_or_insert_with(|| StateFileError::io(path, e));
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Which file sits at a path, as opposed to what it contains.
///
/// Two empty locks read the same, so stale removal compares this instead.
/// The modification time guards against inode reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStamp {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    modified: Option<SystemTime>,
}

impl LockStamp {
    #[cfg(unix)]
    fn of(meta: &fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            dev: meta.dev(),
            ino: meta.ino(),
            modified: meta.modified().ok(),
        }
    }

    #[cfg(not(unix))]
    fn of(meta: &fs::Metadata) -> Self {
        Self {
            modified: meta.modified().ok(),
        }
    }
}

/// Delete a file (idempotent - no error if missing). Returns whether it existed.
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Read a decimal PID file without heap allocation.
pub(crate) fn read_pid_file(path: &Path) -> Option<u32> {
    let mut file = File::open(path).ok()?;
    let mut buf = [0u8; PID_BUF_LEN];
    let mut len = 0;
    loop {
        match file.read(&mut buf[len..]) {
            Ok(0) => break,
            Ok(n) => {
                len += n;
                if len == buf.len() {
                    // Too long to be a PID
                    return None;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(_) => return None,
        }
    }
    parse_pid(&buf[..len])
}

/// Parse `<digits>` with an optional trailing newline. Zero is rejected.
pub(crate) fn parse_pid(bytes: &[u8]) -> Option<u32> {
    let digits = bytes
        .strip_suffix(b"\n")
        .map_or(bytes, |rest| rest.strip_suffix(b"\r").unwrap_or(rest));

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    std::str::from_utf8(digits)
        .ok()?
        .parse::<u32>()
        .ok()
        .filter(|pid| *pid != 0)
}

#[cfg(unix)]
fn exclusive_open(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o644)
        .open(path)
}

#[cfg(not(unix))]
fn exclusive_open(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

fn write_state_mirror(path: &Path, record: &StateRecord) -> io::Result<()> {
    let json = serde_json::to_vec(record).map_err(io::Error::other)?;
    write_atomic(path, &json)
}

/// Write via temp file + rename so readers never see partial content.
fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(format!(".tmp-{}", process::id()));
    let temp_path = path.with_file_name(temp_name);
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path).inspect_err(|_| {
        let _ = fs::remove_file(&temp_path);
    })
}
