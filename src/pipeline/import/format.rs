use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ImportError;

/// Where the bytes of a candidate file live.
#[derive(Debug, Clone)]
pub enum FileSource {
    Disk(PathBuf),
    Memory(Arc<Vec<u8>>),
}

/// A file picked by the user, before upload.
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    size_bytes: u64,
    mime_type: String,
    source: FileSource,
}

impl FileHandle {
    /// Build a handle from an on-disk file. The MIME type is guessed from the
    /// extension, the way a browser fills `File.type`.
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(ImportError::NotAFile(path.display().to_string()));
        }
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            name: sanitize_filename(&path.to_string_lossy()),
            size_bytes: metadata.len(),
            mime_type,
            source: FileSource::Disk(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: &str, mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: sanitize_filename(name),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.to_string(),
            source: FileSource::Memory(Arc::new(bytes)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// May be empty when the type is unknown.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Lower-cased extension with its leading dot (`".pdf"`), if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>, ImportError> {
        match &self.source {
            FileSource::Disk(path) => Ok(tokio::fs::read(path).await?),
            FileSource::Memory(bytes) => Ok(bytes.as_ref().clone()),
        }
    }
}

/// Strip path components and NULs, cap at 255 chars.
pub fn sanitize_filename(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");

    let clean: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .take(255)
        .collect();

    if clean.is_empty() {
        "document".to_string()
    } else {
        clean
    }
}

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Human-readable size: binary units, two decimals, trailing zeros trimmed.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut exp = 0;
    let mut size = bytes as f64;
    while size >= 1024.0 && exp < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        exp += 1;
    }
    let rounded = format!("{size:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[exp])
}
