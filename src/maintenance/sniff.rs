//! Content sniffing from leading file bytes.
//!
//! Binary formats are recognized by `infer`. SVG has no magic number and is
//! checked first, since `infer` would report an XML-prologued SVG as plain XML.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Number of leading bytes inspected.
pub const SNIFF_LEN: u64 = 8192;

/// Detect a MIME type from the leading bytes of a file.
pub fn sniff(head: &[u8]) -> Option<&'static str> {
    sniff_svg(head).or_else(|| infer::get(head).map(|kind| kind.mime_type()))
}

fn sniff_svg(head: &[u8]) -> Option<&'static str> {
    let head = head.strip_prefix(b"\xef\xbb\xbf").unwrap_or(head);
    let start = head.iter().position(|b| !b.is_ascii_whitespace())?;
    let text = &head[start..];

    let is_svg = starts_with_ignore_case(text, b"<svg")
        || (text.starts_with(b"<?xml") && text.windows(4).any(|w| w.eq_ignore_ascii_case(b"<svg")));
    is_svg.then_some("image/svg+xml")
}

fn starts_with_ignore_case(text: &[u8], prefix: &[u8]) -> bool {
    text.len() >= prefix.len() && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Read the first [`SNIFF_LEN`] bytes of `path` and sniff them.
pub fn sniff_file(path: &Path) -> io::Result<Option<&'static str>> {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(sniff(&head))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_signatures() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), Some("image/png"));
        assert_eq!(sniff(b"\xff\xd8\xff\xe0\0\x10JFIF"), Some("image/jpeg"));
        assert_eq!(sniff(b"GIF89a\x01\0\x01\0"), Some("image/gif"));
        assert_eq!(sniff(b"%PDF-1.7\n"), Some("application/pdf"));
        assert_eq!(sniff(b"RIFF\x24\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff(b"RIFF\x24\0\0\0WAVEfmt "), Some("audio/x-wav"));
    }

    #[test]
    fn test_iso_media_brands() {
        assert_eq!(sniff(b"\0\0\0\x18ftypavif\0\0\0\0mif1avif"), Some("image/avif"));
        assert_eq!(sniff(b"\0\0\0\x18ftypheic\0\0\0\0mif1heic"), Some("image/heif"));
        assert_eq!(sniff(b"\0\0\0\x14ftypqt  \0\0\x02\0qt  "), Some("video/quicktime"));
        assert_eq!(sniff(b"\0\0\0\x18ftypmp42\0\0\0\0mp42isom"), Some("video/mp4"));
    }

    #[test]
    fn test_mpeg_audio_without_id3() {
        assert_eq!(sniff(b"\xff\xfb\x90\x64\0\0\0\0"), Some("audio/mpeg"));
        assert_eq!(sniff(b"ID3\x04\0\0\0\0\0\0"), Some("audio/mpeg"));
    }

    #[test]
    fn test_svg() {
        assert_eq!(sniff(b"  <svg xmlns=\"http://www.w3.org/2000/svg\">"), Some("image/svg+xml"));
        assert_eq!(sniff(b"<?xml version=\"1.0\"?>\n<svg>"), Some("image/svg+xml"));
        assert_ne!(sniff(b"<?xml version=\"1.0\"?>\n<status/>"), Some("image/svg+xml"));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(sniff(b"Service is in maintenance mode"), None);
        assert_eq!(sniff(b""), None);
        assert_eq!(sniff(b"\x89PN"), None);
    }
}
