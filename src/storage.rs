//! Blob store collaborators.
//!
//! The codec treats storage as an opaque content-addressed byte store:
//! `put` returns a handle derived from the content, `get` resolves it.
//! The real deployment target is an IPFS-style gateway; [`DiskStore`] and
//! [`MemoryStore`] implement the same contract locally.

use anyhow::{Context, Result, bail};
use getrandom::fill;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Opaque address of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHandle(String);

impl ContentHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ContentHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Content address of a byte buffer (SHA-256, lowercase hex).
pub fn content_address(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// An opaque blob store the codec hands ciphertext to.
///
/// Implementations must return the same handle for the same bytes and must
/// hand back blobs unmodified. The name hint is transport metadata only and
/// must not affect addressing.
pub trait BlobStore {
    fn put(&self, data: &[u8], name_hint: &str) -> Result<ContentHandle>;
    fn get(&self, handle: &ContentHandle) -> Result<Vec<u8>>;
}

/// Content-addressed store backed by a directory, one file per blob.
///
/// `DiskStore` writes blobs under their content address using atomic
/// replace, so a crash mid-write leaves either no blob or a complete one,
/// never a torn file.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Creates a new DiskStore rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn blob_path(&self, handle: &ContentHandle) -> Result<PathBuf> {
        // Handles are hex digests; anything else is not one of ours and
        // must not be turned into a path.
        if handle.as_str().is_empty()
            || !handle.as_str().bytes().all(|b| b.is_ascii_hexdigit())
        {
            bail!("malformed content handle '{handle}'");
        }
        Ok(self.root.join(handle.as_str()))
    }

    /// Saves data to the target path using atomic write.
    ///
    /// 1. Writes data to a temporary file with random name
    /// 2. Syncs the temporary file to disk
    /// 3. Atomically replaces the target with the temporary file
    /// 4. Syncs the parent directory so the rename is persisted
    fn save(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let tmp_path = random_tmp_path(path)?;

        // securely create temp file (fail if exists)
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .context("failed to create temporary file")?;

        tmp_file.write_all(data)?;
        tmp_file.sync_all()?; //fsync file
        drop(tmp_file);

        //atomic replace
        if let Err(e) = atomic_replace(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // fsync directory
        let dir = File::open(&self.root)?;
        dir.sync_all()?;

        Ok(())
    }
}

impl BlobStore for DiskStore {
    fn put(&self, data: &[u8], _name_hint: &str) -> Result<ContentHandle> {
        let handle = ContentHandle(content_address(data));
        let path = self.blob_path(&handle)?;

        // Same content, same blob; nothing to rewrite.
        if !path.exists() {
            self.save(&path, data)?;
        }

        Ok(handle)
    }

    fn get(&self, handle: &ContentHandle) -> Result<Vec<u8>> {
        let path = self.blob_path(handle)?;
        let data = fs::read(&path)
            .with_context(|| format!("blob '{handle}' not found"))?;

        if content_address(&data) != handle.as_str() {
            bail!("blob '{handle}' failed content verification");
        }

        Ok(data)
    }
}

/// In-memory store for tests and ephemeral pipelines.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryStore {
    fn put(&self, data: &[u8], _name_hint: &str) -> Result<ContentHandle> {
        let address = content_address(data);
        self.blobs
            .lock()
            .unwrap()
            .insert(address.clone(), data.to_vec());
        Ok(ContentHandle(address))
    }

    fn get(&self, handle: &ContentHandle) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(handle.as_str())
            .cloned()
            .with_context(|| format!("blob '{handle}' not found"))
    }
}

/// Generates a unique temporary file path in the same directory.
///
/// Uses cryptographically secure random bytes to avoid name collisions.
/// Format: `filename.tmp.<randomhex>`
fn random_tmp_path(path: &Path) -> Result<PathBuf> {
    let mut buf = [0u8; 8]; // 64 bit entropy
    fill(&mut buf)?;

    let rand_string = buf.iter().map(|b| format!("{:02x}", b)).collect::<String>();

    let file_name = path.file_name().unwrap().to_string_lossy();

    let tmp_name = format!("{}.tmp.{}", file_name, rand_string);

    Ok(path.with_file_name(tmp_name))
}

/// Atomically replaces the target file with the temporary file.
///
/// Uses Windows `ReplaceFileW` API with `REPLACEFILE_WRITE_THROUGH` flag
/// to ensure the operation is truly atomic and persisted to disk.
#[cfg(target_os = "windows")]
fn atomic_replace(tmp_path: &Path, target: &Path) -> Result<()> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

    fn to_wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    // ReplaceFileW fails if the target does not exist yet
    if !target.exists() {
        fs::rename(tmp_path, target)?;
        return Ok(());
    }

    let target_w = to_wide(target.as_os_str());
    let tmp_w = to_wide(tmp_path.as_os_str());

    // SAFETY:
    // - Strings are valid UTF-16 and null-terminated
    // - Pointers remain valid during the call
    // - Windows does not retain the pointers after return
    let result = unsafe {
        ReplaceFileW(
            target_w.as_ptr(),
            tmp_w.as_ptr(),
            std::ptr::null(),
            REPLACEFILE_WRITE_THROUGH,
            std::ptr::null(),
            std::ptr::null(),
        )
    };

    if result == 0 {
        let err = std::io::Error::last_os_error();
        return Err(err).context("atomic replace failed");
    }

    Ok(())
}

/// Atomically replaces the target file with the temporary file.
///
/// On Unix, `rename()` is atomic when both paths are on the same filesystem.
#[cfg(not(target_os = "windows"))]
fn atomic_replace(tmp_path: &Path, target: &Path) -> Result<()> {
    fs::rename(tmp_path, target)?;
    Ok(())
}
