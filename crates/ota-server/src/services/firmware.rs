//! Firmware file loading and the download response.
//!
//! The file is read into memory once; the same buffer is hashed for the
//! `x-MD5` header and sent as the body.

use std::path::Path;

use axum::{
    body::Body,
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};

/// Header the ESP `httpUpdate` client compares against its own digest.
pub const X_MD5: HeaderName = HeaderName::from_static("x-md5");

/// Per-request facts about the file being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResponseMetadata {
    pub size: u64,
    pub content_md5: String,
    pub disposition_filename: String,
}

/// A firmware file read from the catalog, ready to be sent.
#[derive(Debug)]
pub struct FirmwareImage {
    pub metadata: FileResponseMetadata,
    pub bytes: Vec<u8>,
}

impl FirmwareImage {
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let disposition_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            metadata: FileResponseMetadata {
                size: bytes.len() as u64,
                content_md5: content_md5(&bytes),
                disposition_filename,
            },
            bytes,
        })
    }
}

/// Lowercase hex MD5 of `data`, 32 characters.
pub fn content_md5(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

impl IntoResponse for FirmwareImage {
    fn into_response(self) -> Response {
        let FileResponseMetadata {
            size,
            content_md5,
            disposition_filename,
        } = self.metadata;

        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={disposition_filename}"),
                ),
                (header::CONTENT_LENGTH, size.to_string()),
                (X_MD5, content_md5),
            ],
            Body::from(self.bytes),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_md5() {
        assert_eq!(content_md5(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            content_md5(b"The quick brown fox jumps over the lazy dog"),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
    }

    #[tokio::test]
    async fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.bin");
        let mut data = vec![0u8; 4096];
        data[0] = 0xE9;
        std::fs::write(&path, &data).unwrap();

        let image = FirmwareImage::load(&path).await.unwrap();
        assert_eq!(image.metadata.size, 4096);
        assert_eq!(image.metadata.disposition_filename, "node.bin");
        assert_eq!(image.metadata.content_md5.len(), 32);
        assert_eq!(image.metadata.content_md5, content_md5(&data));
        assert_eq!(image.bytes, data);
    }

    #[tokio::test]
    async fn test_load_missing_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FirmwareImage::load(&dir.path().join("missing.bin")).await.is_err());
        assert!(FirmwareImage::load(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_response_headers() {
        let image = FirmwareImage {
            metadata: FileResponseMetadata {
                size: 3,
                content_md5: content_md5(b"abc"),
                disposition_filename: "abc.bin".into(),
            },
            bytes: b"abc".to_vec(),
        };
        let resp = image.into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let headers = resp.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=abc.bin"
        );
        assert_eq!(headers[header::CONTENT_LENGTH], "3");
        assert_eq!(headers["x-MD5"], "900150983cd24fb0d6963f7d28e17f72");

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"abc");
    }
}
