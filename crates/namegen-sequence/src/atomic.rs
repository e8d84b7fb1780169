use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `data` to a sibling temp file, fsync it, then rename over `path`.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = parent {
        sync_dir(parent)?;
    }

    Ok(())
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "invalid path for atomic write")
    })?;
    Ok(path.with_file_name(format!("{}.tmp", file_name.to_string_lossy())))
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> io::Result<()> {
    OpenOptions::new().read(true).open(path)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}
