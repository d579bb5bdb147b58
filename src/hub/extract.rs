use base64::Engine;

use super::schema::ContentPayload;

/// Maximum characters of text content sent for remote classification.
pub const MAX_EXCERPT_CHARS: usize = 10_000;

/// Whether content of this MIME type is kept as a data URI rather than text.
pub fn is_binary_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
        || mime_type.starts_with("audio/")
        || mime_type.starts_with("video/")
        || mime_type == "application/pdf"
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// Encode uploaded bytes the way they are stored on the record.
/// Images, audio, video and PDFs become base64 data URIs; the rest is decoded as UTF-8.
pub fn encode_payload(data: &[u8], mime_type: &str) -> ContentPayload {
    if is_binary_mime(mime_type) {
        let b64 = base64::engine::general_purpose::STANDARD.encode(data);
        ContentPayload::DataUri(format!("data:{};base64,{}", mime_type, b64))
    } else {
        ContentPayload::Text(String::from_utf8_lossy(data).into_owned())
    }
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Lowercase extension after the last `.`, or `None` when there is none.
pub fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// MIME type for uploads that arrive without one. Only the media families
/// that decide payload encoding and a few text formats are recognized.
pub fn guess_mime_type(filename: &str) -> String {
    let ext = extension(filename).unwrap_or_default();
    let mime = match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_and_pdf_become_data_uris() {
        for mime in ["image/png", "audio/ogg", "video/mp4", "application/pdf"] {
            let payload = encode_payload(b"hi", mime);
            assert_eq!(
                payload,
                ContentPayload::DataUri(format!("data:{mime};base64,aGk="))
            );
        }
    }

    #[test]
    fn other_types_are_text() {
        assert_eq!(
            encode_payload(b"hello", "text/plain"),
            ContentPayload::Text("hello".into())
        );
        assert_eq!(
            encode_payload(b"{}", "application/json"),
            ContentPayload::Text("{}".into())
        );
    }

    #[test]
    fn excerpt_counts_chars_not_bytes() {
        assert_eq!(excerpt("ããããã", 3), "ããã");
        assert_eq!(excerpt("abc", 10), "abc");
        assert_eq!(excerpt("", 0), "");
    }

    #[test]
    fn extension_edge_cases() {
        assert_eq!(extension("Report.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension("README"), None);
        assert_eq!(extension("trailing."), None);
    }

    #[test]
    fn guesses_common_types() {
        assert_eq!(guess_mime_type("a.JPG"), "image/jpeg");
        assert_eq!(guess_mime_type("clip.mov"), "video/quicktime");
        assert_eq!(guess_mime_type("noext"), "application/octet-stream");
    }
}
