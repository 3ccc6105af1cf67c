//! # Uploaded Files
//!
//! Bulk order files as the checkout receives them: a name, a size, and
//! content that is only read once the metadata checks pass.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use lustre_core::bulk_order::{
    check_file_metadata, validate_csv_content, BulkOrderLimits, CsvError, CsvValidationResult,
};

/// A file handed over by the storefront.
#[async_trait]
pub trait UploadedFile: Send + Sync {
    /// File name as uploaded, including the extension.
    fn name(&self) -> &str;

    /// Size in bytes.
    fn size(&self) -> u64;

    /// Reads the whole file as UTF-8 text.
    async fn text(&self) -> io::Result<String>;
}

// =============================================================================
// Implementations
// =============================================================================

/// A file on local disk.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
}

impl LocalFile {
    /// Stats the file; the content is not read yet.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(LocalFile {
            path,
            name,
            size: metadata.len(),
        })
    }
}

#[async_trait]
impl UploadedFile for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn text(&self) -> io::Result<String> {
        tokio::fs::read_to_string(&self.path).await
    }
}

/// A file already held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    name: String,
    bytes: Vec<u8>,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        InMemoryFile {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl UploadedFile for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    async fn text(&self) -> io::Result<String> {
        String::from_utf8(self.bytes.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validates an uploaded bulk order file.
///
/// ## Steps
/// 1. Extension and size, from metadata only
/// 2. Read the content; a failed read is a single `Failed to read file` error
/// 3. Structural and per-row checks on the text
///
/// Never fails: every problem is reported inside the result.
pub async fn validate_csv_file(
    file: &dyn UploadedFile,
    limits: &BulkOrderLimits,
) -> CsvValidationResult {
    if let Err(error) = check_file_metadata(file.name(), file.size(), limits) {
        debug!(name = %file.name(), size = file.size(), reason = %error.message, "Upload rejected");
        return CsvValidationResult::rejected(error, 0);
    }

    let text = match file.text().await {
        Ok(text) => text,
        Err(e) => {
            warn!(name = %file.name(), error = %e, "Failed to read uploaded file");
            return CsvValidationResult::rejected(CsvError::file("Failed to read file"), 0);
        }
    };

    let result = validate_csv_content(&text, limits);
    debug!(
        name = %file.name(),
        total_rows = result.total_rows,
        valid_rows = result.valid_rows.len(),
        errors = result.errors.len(),
        "Bulk order file validated"
    );
    result
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lustre_core::bulk_order::generate_csv_template;
    use std::io::Write;

    struct UnreadableFile;

    #[async_trait]
    impl UploadedFile for UnreadableFile {
        fn name(&self) -> &str {
            "orders.csv"
        }

        fn size(&self) -> u64 {
            10
        }

        async fn text(&self) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    /// Panics if read; proves metadata checks come first.
    struct HugeFile;

    #[async_trait]
    impl UploadedFile for HugeFile {
        fn name(&self) -> &str {
            "orders.csv"
        }

        fn size(&self) -> u64 {
            50 * 1024 * 1024
        }

        async fn text(&self) -> io::Result<String> {
            panic!("content must not be read");
        }
    }

    #[tokio::test]
    async fn test_template_upload_is_valid() {
        let file = InMemoryFile::new("bulk.csv", generate_csv_template());
        let result = validate_csv_file(&file, &BulkOrderLimits::default()).await;
        assert!(result.valid);
        assert_eq!(result.valid_rows.len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_extension() {
        let file = InMemoryFile::new("bulk.txt", generate_csv_template());
        let result = validate_csv_file(&file, &BulkOrderLimits::default()).await;
        assert_eq!(result.errors[0].message, "Invalid file type. Please upload a CSV file");
    }

    #[tokio::test]
    async fn test_oversized_file_is_not_read() {
        let result = validate_csv_file(&HugeFile, &BulkOrderLimits::default()).await;
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "File size exceeds maximum of 5MB");
    }

    #[tokio::test]
    async fn test_read_failure() {
        let result = validate_csv_file(&UnreadableFile, &BulkOrderLimits::default()).await;
        assert!(!result.valid);
        assert_eq!(result.errors, vec![CsvError::file("Failed to read file")]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_a_read_failure() {
        let file = InMemoryFile::new("bulk.csv", vec![0xff, 0xfe, 0x00]);
        let result = validate_csv_file(&file, &BulkOrderLimits::default()).await;
        assert_eq!(result.errors[0].message, "Failed to read file");
    }

    #[tokio::test]
    async fn test_local_file() {
        let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(tmp, "{}", generate_csv_template()).unwrap();

        let file = LocalFile::open(tmp.path()).await.unwrap();
        assert!(file.name().ends_with(".csv"));
        assert_eq!(file.size(), generate_csv_template().len() as u64);

        let result = validate_csv_file(&file, &BulkOrderLimits::default()).await;
        assert!(result.valid, "{:?}", result.errors);
    }
}
