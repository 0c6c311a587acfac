//! Error type for caller bugs detected at the engine boundary.
//!
//! Runtime conditions (engine not running, missing config node, a native call
//! reporting failure) are never errors here; they surface as `bool`,
//! `Option` or an empty value. `BridgeError` is reserved for input the caller
//! should never have produced.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A string handed to the engine contains an interior NUL byte.
    #[error("{field} contains an interior NUL byte at offset {offset}")]
    InteriorNul { field: &'static str, offset: usize },

    /// A directory path cannot be represented as UTF-8 text.
    #[error("{field} is not valid UTF-8: {path}")]
    NonUtf8Path { field: &'static str, path: PathBuf },
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Reject text the engine would truncate at the first NUL.
pub fn check_text(field: &'static str, text: &str) -> Result<()> {
    match text.find('\0') {
        Some(offset) => Err(BridgeError::InteriorNul { field, offset }),
        None => Ok(()),
    }
}

/// Convert a directory path into the text form the engine traits expect.
pub fn path_text(field: &'static str, path: &std::path::Path) -> Result<String> {
    let text = path.to_str().ok_or_else(|| BridgeError::NonUtf8Path {
        field,
        path: path.to_path_buf(),
    })?;
    check_text(field, text)?;
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_text_reports_offset() {
        let err = check_text("schema id", "luna\0pinyin").unwrap_err();
        match err {
            BridgeError::InteriorNul { field, offset } => {
                assert_eq!(field, "schema id");
                assert_eq!(offset, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(check_text("schema id", "luna_pinyin").is_ok());
    }

    #[test]
    fn test_path_text_roundtrips_utf8() {
        let path = std::path::Path::new("/sdcard/rime");
        assert_eq!(path_text("user data dir", path).unwrap(), "/sdcard/rime");
    }

    #[cfg(unix)]
    #[test]
    fn test_path_text_rejects_non_utf8() {
        use std::os::unix::ffi::OsStrExt;
        let raw = std::ffi::OsStr::from_bytes(&[0x2f, 0xff, 0xfe]);
        let err = path_text("shared data dir", std::path::Path::new(raw)).unwrap_err();
        assert!(matches!(err, BridgeError::NonUtf8Path { .. }));
    }
}
