//! Zip bundling for multi-file downloads.

use dropgate_core::AppError;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// Sanitize a filename for use as an archive entry to prevent path
/// traversal. Extracts only the base name (strips components like `../`).
pub fn sanitize_archive_filename(filename: &str, fallback: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

/// Build a ZIP archive in memory from already-decrypted file contents.
///
/// Duplicate entry names get a numeric suffix so no file silently
/// overwrites another inside the archive.
pub fn bundle_zip(files: Vec<(Uuid, String, Vec<u8>)>) -> Result<Vec<u8>, AppError> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let mut buffer = Vec::new();
    {
        let mut archive = ZipWriter::new(std::io::Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let mut used_names: Vec<String> = Vec::new();
        for (file_id, filename, data) in files {
            let safe_name =
                sanitize_archive_filename(&filename, &format!("unnamed_{}", file_id));
            let entry_name = dedupe_entry_name(&used_names, &safe_name);
            used_names.push(entry_name.clone());

            archive
                .start_file(&entry_name, options)
                .map_err(|e| AppError::Internal(format!("Failed to add zip entry: {}", e)))?;
            archive
                .write_all(&data)
                .map_err(|e| AppError::Internal(format!("Failed to write zip entry: {}", e)))?;
        }

        archive
            .finish()
            .map_err(|e| AppError::Internal(format!("Failed to finalize zip: {}", e)))?;
    }

    Ok(buffer)
}

fn dedupe_entry_name(used: &[String], name: &str) -> String {
    if !used.iter().any(|n| n == name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{}", ext)),
        _ => (name.to_string(), String::new()),
    };
    let mut counter = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, counter, ext);
        if !used.iter().any(|n| n == &candidate) {
            return candidate;
        }
        counter += 1;
    }
}
