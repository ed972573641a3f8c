use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Copies an existing datastore file to a timestamped sibling before it is opened.
///
/// Snapshots are named `<file>.<YYYYMMDDTHHMMSSZ>.bak`. When that name is taken a
/// counter is inserted (`<file>.<stamp>.1.bak`, `.2.bak`, ...); an existing snapshot
/// is never overwritten. Returns `None` when there is nothing to back up.
pub fn snapshot(path: &Path, now: DateTime<Utc>) -> io::Result<Option<PathBuf>> {
    let mut source = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "datastore path has no file name"))?;
    let stamp = now.format("%Y%m%dT%H%M%SZ").to_string();

    let mut attempt = 0u32;
    loop {
        let candidate = path.with_file_name(snapshot_name(&file_name, &stamp, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut target) => {
                io::copy(&mut source, &mut target)?;
                target.sync_all()?;
                return Ok(Some(candidate));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

fn snapshot_name(file_name: &str, stamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}.{}.bak", file_name, stamp)
    } else {
        format!("{}.{}.{}.bak", file_name, stamp, attempt)
    }
}
