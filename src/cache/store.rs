//! Reading and writing cache files.
//!
//! Files are named `<operation>_<fingerprint>_<YYYY-MM-DD_HHMMSS>.<ext>`.

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::cache::{CacheError, Cacheable, Fingerprint, StorageFormat};

/// `strftime` layout of the timestamp embedded in file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// The file name for a result of `operation`, fingerprinted `fp`, written at
/// `created_at`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use steadfast::cache::{file_name, Fingerprint, StorageFormat};
///
/// let at = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(7, 5, 0).unwrap();
/// let fp = Fingerprint::of_signature("gauss(10.0, 3.0)");
/// let name = file_name("gauss", &fp, at, StorageFormat::Binary);
/// assert_eq!(name, format!("gauss_{}_2024-03-09_070500.bin", fp));
/// ```
pub fn file_name(
    operation: &str,
    fp: &Fingerprint,
    created_at: NaiveDateTime,
    format: StorageFormat,
) -> String {
    format!(
        "{}_{}_{}.{}",
        operation,
        fp,
        created_at.format(TIMESTAMP_FORMAT),
        format.extension()
    )
}

/// Operation names end up in file names, so they must be a single path
/// component.
pub(crate) fn check_operation_name(name: &str) -> Result<(), CacheError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.chars().any(|c| c == '/' || c == '\\' || c == '\0');
    if bad {
        return Err(CacheError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Encode `value` and write it under `dir`, returning the final path.
///
/// The bytes go to a temporary sibling first and are renamed into place, so
/// a crash never leaves a truncated file under a name the inventory scan
/// recognizes.
pub(crate) fn write<T: Cacheable>(
    dir: &Path,
    operation: &str,
    fp: &Fingerprint,
    created_at: NaiveDateTime,
    value: &T,
) -> Result<PathBuf, CacheError> {
    std::fs::create_dir_all(dir).map_err(io_error(dir))?;

    let path = dir.join(file_name(operation, fp, created_at, T::FORMAT));
    let bytes = value.encode().map_err(|source| CacheError::Codec {
        path: path.clone(),
        source,
    })?;

    let tmp = path.with_extension(format!("{}.tmp", T::FORMAT.extension()));
    std::fs::write(&tmp, &bytes).map_err(io_error(&tmp))?;
    if let Err(source) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(CacheError::Io { path, source });
    }
    Ok(path)
}

/// Load a value written by [`write`].
pub(crate) fn read<T: Cacheable>(path: &Path) -> Result<T, CacheError> {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(StorageFormat::from_extension);
    if format != Some(T::FORMAT) {
        return Err(CacheError::FormatMismatch {
            path: path.to_path_buf(),
            expected: T::FORMAT,
        });
    }

    let bytes = std::fs::read(path).map_err(io_error(path))?;
    T::decode(&bytes).map_err(|source| CacheError::Codec {
        path: path.to_path_buf(),
        source,
    })
}

/// Delete a superseded file. Failures are logged, never returned: the new
/// result is already stored and the stale file is merely left behind.
pub(crate) fn remove_stale(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed superseded cache file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove superseded cache file"
        ),
    }
}
