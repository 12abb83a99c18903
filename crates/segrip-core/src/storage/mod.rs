//! Segment files on disk.
//!
//! Each segment is written to `<path>.part` and renamed into place, so a
//! segment file that exists is always complete. Presence is the only
//! completion state there is.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `video3.jpeg` → `video3.jpeg.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Writes `data` to `final_path` via a temp file and rename.
pub fn write_segment(final_path: &Path, data: &[u8]) -> io::Result<()> {
    let tp = temp_path(final_path);
    {
        let mut f = fs::File::create(&tp)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(&tp, final_path).map_err(|e| {
        let _ = fs::remove_file(&tp);
        e
    })
}

/// Creates the directory if missing.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Removes a job's segment directory and everything in it. Missing dir is fine.
pub fn remove_segment_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
