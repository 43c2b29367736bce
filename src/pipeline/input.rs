//! Transcript intake: accept the one PDF the user picked.
//!
//! A transcript arrives either as a path (file picker, command line) or as
//! bytes already in memory (drag-drop). Both are checked for the `%PDF`
//! header before anything is handed to pdfium, so a wrong file fails fast
//! with a clear error instead of a pdfium load failure.

use crate::error::AnalysisError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Reject content that does not start with the PDF header.
///
/// `path` is only used for the error message.
pub fn check_pdf_header(path: &Path, head: &[u8]) -> Result<(), AnalysisError> {
    if head.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(magic.len());
    magic[..n].copy_from_slice(&head[..n]);
    Err(AnalysisError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

/// Check that `path` names a readable PDF and return it as an owned path.
pub async fn open_transcript(path: impl AsRef<Path>) -> Result<PathBuf, AnalysisError> {
    let path = path.as_ref().to_path_buf();

    let mut file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AnalysisError::PermissionDenied { path });
        }
        Err(_) => return Err(AnalysisError::FileNotFound { path }),
    };
    let is_file = file
        .metadata()
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(AnalysisError::FileNotFound { path });
    }

    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    (&mut file)
        .take(PDF_MAGIC.len() as u64)
        .read_to_end(&mut head)
        .await
        .map_err(|_| AnalysisError::FileNotFound { path: path.clone() })?;
    check_pdf_header(&path, &head)?;

    debug!("Transcript PDF: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn header_check() {
        let p = Path::new("cvr.pdf");
        assert!(check_pdf_header(p, b"%PDF-1.7\n%").is_ok());
        match check_pdf_header(p, b"PK") {
            Err(AnalysisError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"PK\0\0"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = open_transcript("/definitely/not/here.pdf").await.unwrap_err();
        assert!(matches!(err, AnalysisError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn directory_is_not_a_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_transcript(dir.path()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn non_pdf_is_rejected() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"hello, not a pdf").unwrap();
        match open_transcript(tmp.path()).await.unwrap_err() {
            AnalysisError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn truncated_file_is_rejected() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%P").unwrap();
        let err = open_transcript(tmp.path()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn pdf_header_is_accepted() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.7\n").unwrap();
        let path = open_transcript(tmp.path()).await.unwrap();
        assert_eq!(path, tmp.path());
    }
}
