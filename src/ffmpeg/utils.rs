//! Utility functions for FFmpeg operations.
use std::path::Path;

/// Rounds a dimension down to the nearest even number.
///
/// libx264 with yuv420p chroma subsampling rejects odd frame sizes, so
/// captured region dimensions are evened before they reach the command line.
pub fn round_to_even(value: u32) -> u32 {
    if value % 2 == 0 {
        value
    } else {
        value - 1
    }
}

/// Whether a file exists but contains no data. FFmpeg leaves a zero-byte
/// container behind when it is stopped before writing a single frame.
pub fn file_is_empty(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => false,
    }
}

/// Escapes a path for a concat demuxer manifest line. The manifest format
/// wraps paths in single quotes, with embedded single quotes written as
/// `'\''`, and takes backslashes literally only outside quotes, so Windows
/// separators are normalized to forward slashes.
pub fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_round_to_even() {
        assert_eq!(round_to_even(1920), 1920);
        assert_eq!(round_to_even(1921), 1920);
        assert_eq!(round_to_even(1), 0);
        assert_eq!(round_to_even(0), 0);
    }

    #[test]
    fn test_escape_concat_path() {
        let plain = PathBuf::from("C:\\temp\\segment_0.mp4");
        assert_eq!(escape_concat_path(&plain), "C:/temp/segment_0.mp4");

        let quoted = PathBuf::from("/tmp/user's clips/segment_0.mp4");
        assert_eq!(
            escape_concat_path(&quoted),
            r"/tmp/user'\''s clips/segment_0.mp4"
        );
    }

    #[test]
    fn test_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.mp4");
        let full = dir.path().join("full.mp4");
        std::fs::write(&empty, b"").unwrap();
        std::fs::write(&full, b"data").unwrap();

        assert!(file_is_empty(&empty));
        assert!(!file_is_empty(&full));
        assert!(!file_is_empty(&dir.path().join("missing.mp4")));
    }
}
