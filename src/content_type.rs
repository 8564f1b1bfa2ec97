//! Content type sniffing / 内容类型探测
//!
//! Best effort: signatures are matched against the leading bytes of the
//! content. Anything unrecognised resolves to [`OCTET_STREAM`], never an error.

use tokio::io::AsyncReadExt;

use crate::storage::Content;

/// Fallback when nothing matches / 无法识别时的类型
pub const OCTET_STREAM: &str = "application/octet-stream";
/// Zero-length content / 空内容
pub const EMPTY: &str = "application/x-empty";
pub const TEXT_PLAIN: &str = "text/plain";

/// Bytes inspected per sniff / 探测读取的字节数
const SNIFF_LEN: usize = 512;

/// (offset, signature, mime)
const SIGNATURES: &[(usize, &[u8], &str)] = &[
    (0, b"\x89PNG\r\n\x1a\n", "image/png"),
    (0, b"\xFF\xD8\xFF", "image/jpeg"),
    (0, b"GIF87a", "image/gif"),
    (0, b"GIF89a", "image/gif"),
    (0, b"BM", "image/bmp"),
    (0, b"II*\x00", "image/tiff"),
    (0, b"MM\x00*", "image/tiff"),
    (0, b"\x00\x00\x01\x00", "image/vnd.microsoft.icon"),
    (0, b"%PDF-", "application/pdf"),
    (0, b"PK\x03\x04", "application/zip"),
    (0, b"\x1F\x8B", "application/gzip"),
    (0, b"BZh", "application/x-bzip2"),
    (0, b"\xFD7zXZ\x00", "application/x-xz"),
    (0, b"7z\xBC\xAF\x27\x1C", "application/x-7z-compressed"),
    (0, b"Rar!\x1A\x07", "application/vnd.rar"),
    (0, b"\x00asm", "application/wasm"),
    (0, b"\x7FELF", "application/x-executable"),
    (0, b"ID3", "audio/mpeg"),
    (0, b"OggS", "audio/ogg"),
    (0, b"fLaC", "audio/flac"),
    (0, b"\x1A\x45\xDF\xA3", "video/webm"),
    (4, b"ftyp", "video/mp4"),
    (0, b"%!PS", "application/postscript"),
    (0, b"{\\rtf", "text/rtf"),
];

/// Sniff the type of an in-memory buffer / 探测内存数据类型
pub fn sniff_bytes(data: &[u8]) -> &'static str {
    if data.is_empty() {
        return EMPTY;
    }
    let head = &data[..data.len().min(SNIFF_LEN)];

    for (offset, signature, mime) in SIGNATURES {
        if head.len() >= offset + signature.len()
            && &head[*offset..offset + signature.len()] == *signature
        {
            return *mime;
        }
    }

    // RIFF container: the format tag sits at offset 8
    if head.len() >= 12 && &head[..4] == b"RIFF" {
        match &head[8..12] {
            b"WEBP" => return "image/webp",
            b"WAVE" => return "audio/x-wav",
            b"AVI " => return "video/x-msvideo",
            _ => {}
        }
    }

    if let Some(mime) = sniff_markup(head) {
        return mime;
    }

    if looks_like_text(head, data.len() > SNIFF_LEN) {
        TEXT_PLAIN
    } else {
        OCTET_STREAM
    }
}

/// Guess the content type of write content / 推测写入内容的类型
///
/// File content is sniffed from its leading bytes; when that is inconclusive
/// the file extension decides.
pub async fn guess_content_type(content: &Content) -> String {
    match content {
        Content::Bytes(data) => sniff_bytes(data).to_string(),
        Content::File(path) => {
            let sniffed = match read_head(path).await {
                Ok(head) => sniff_bytes(&head),
                Err(e) => {
                    tracing::debug!("Content sniff failed for {:?}: {}", path, e);
                    OCTET_STREAM
                }
            };
            if sniffed == OCTET_STREAM || sniffed == TEXT_PLAIN {
                if let Some(guess) = mime_guess::from_path(path).first() {
                    return guess.essence_str().to_string();
                }
            }
            sniffed.to_string()
        }
    }
}

async fn read_head(path: &std::path::Path) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    let mut reader = file.take(SNIFF_LEN as u64);
    reader.read_to_end(&mut head).await?;
    Ok(head)
}

fn sniff_markup(head: &[u8]) -> Option<&'static str> {
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let trimmed = &head[start..];
    let lower: Vec<u8> = trimmed
        .iter()
        .take(16)
        .map(|b| b.to_ascii_lowercase())
        .collect();

    if lower.starts_with(b"<?xml") {
        if trimmed.windows(4).any(|w| w == b"<svg") {
            return Some("image/svg+xml");
        }
        return Some("text/xml");
    }
    if lower.starts_with(b"<svg") {
        return Some("image/svg+xml");
    }
    if lower.starts_with(b"<!doctype html") || lower.starts_with(b"<html") {
        return Some("text/html");
    }
    None
}

/// Text if there are no NUL bytes and it decodes as UTF-8. A multi-byte
/// sequence cut at the sniff boundary is tolerated.
fn looks_like_text(head: &[u8], truncated: bool) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => truncated && e.error_len().is_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::io::Write;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    #[test]
    fn test_sniff_png() {
        assert_eq!(sniff_bytes(PNG_HEADER), "image/png");
    }

    #[test]
    fn test_sniff_common_signatures() {
        assert_eq!(sniff_bytes(b"\xFF\xD8\xFF\xE0\x00\x10JFIF"), "image/jpeg");
        assert_eq!(sniff_bytes(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(sniff_bytes(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff_bytes(b"PK\x03\x04\x14\x00"), "application/zip");
        assert_eq!(sniff_bytes(b"RIFF\x24\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(sniff_bytes(b"\x00\x00\x00\x18ftypmp42"), "video/mp4");
    }

    #[test]
    fn test_sniff_markup_and_text() {
        assert_eq!(sniff_bytes(b"  <!DOCTYPE html><html>"), "text/html");
        assert_eq!(sniff_bytes(b"<?xml version=\"1.0\"?><root/>"), "text/xml");
        assert_eq!(sniff_bytes(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"), "image/svg+xml");
        assert_eq!(sniff_bytes("hello 世界".as_bytes()), TEXT_PLAIN);
    }

    #[test]
    fn test_sniff_fallbacks() {
        assert_eq!(sniff_bytes(b""), EMPTY);
        assert_eq!(sniff_bytes(b"\x00\x01\x02\x03garbage"), OCTET_STREAM);
        assert_eq!(sniff_bytes(&[0xC3, 0x28, 0x41]), OCTET_STREAM);
    }

    #[test]
    fn test_truncated_utf8_still_text() {
        let mut data = "a".repeat(SNIFF_LEN - 1).into_bytes();
        data.extend_from_slice("é".as_bytes());
        assert_eq!(sniff_bytes(&data), TEXT_PLAIN);
    }

    #[tokio::test]
    async fn test_guess_bytes() {
        let content = Content::Bytes(Bytes::from_static(PNG_HEADER));
        assert_eq!(guess_content_type(&content).await, "image/png");
    }

    #[tokio::test]
    async fn test_guess_file_by_magic() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(PNG_HEADER).unwrap();
        let content = Content::File(file.path().to_path_buf());
        assert_eq!(guess_content_type(&content).await, "image/png");
    }

    #[tokio::test]
    async fn test_guess_file_falls_back_to_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{\"a\": 1}").unwrap();
        let content = Content::File(file.path().to_path_buf());
        assert_eq!(guess_content_type(&content).await, "application/json");
    }

    #[tokio::test]
    async fn test_guess_missing_file_is_unknown() {
        let content = Content::File("/nonexistent/dir/blob".into());
        assert_eq!(guess_content_type(&content).await, OCTET_STREAM);
    }
}
