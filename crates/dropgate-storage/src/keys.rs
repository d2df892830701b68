//! Shared storage path generation for storage backends.
//!
//! Path format: `files/{owner_id}/{sanitized_filename}-{suffix}.enc`. The
//! suffix keeps paths unique when an owner uploads the same filename twice;
//! the `.enc` extension marks every blob as ciphertext.

use rand::Rng;
use uuid::Uuid;

const SUFFIX_LENGTH: usize = 8;
const SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Replace any character outside `[a-zA-Z0-9._-]` with `_`.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Generate a random lowercase alphanumeric uniqueness suffix.
pub fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LENGTH)
        .map(|_| SUFFIX_CHARS[rng.random_range(0..SUFFIX_CHARS.len())] as char)
        .collect()
}

/// Generate the storage path for a new blob. All backends use this format.
pub fn file_storage_path(owner_id: Uuid, filename: &str, suffix: &str) -> String {
    format!(
        "files/{}/{}-{}.enc",
        owner_id,
        sanitize_filename(filename),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("my file (1).txt"), "my_file__1_.txt");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("über.doc"), "_ber.doc");
    }

    #[test]
    fn test_path_format() {
        let owner = Uuid::new_v4();
        let path = file_storage_path(owner, "report.pdf", "1a2b3c4d");
        assert_eq!(path, format!("files/{}/report.pdf-1a2b3c4d.enc", owner));
        assert!(!path.contains(".."));
        assert!(!path.starts_with('/'));
    }

    #[test]
    fn test_random_suffix() {
        let a = random_suffix();
        let b = random_suffix();
        assert_eq!(a.len(), SUFFIX_LENGTH);
        assert!(a.bytes().all(|c| SUFFIX_CHARS.contains(&c)));
        // Not a uniqueness guarantee, but 36^8 collisions are vanishingly rare
        assert_ne!(a, b);
    }
}
