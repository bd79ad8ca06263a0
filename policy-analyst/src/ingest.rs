//! Document ingestion: permissive text decoding of uploaded byte streams.
//!
//! Every reader in this module rewinds the handle to offset 0 after reading,
//! so the same upload can be read again later in the session (follow-up
//! questions, re-summarising after a config change).
//!
//! No format-specific parsing happens here. PDF bytes go through the same
//! decoder as plain text and usually come out garbled or empty.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use sha2::{Digest, Sha256};
use tracing::debug;

/// File extensions accepted by the upload surface.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["txt", "pdf"];

/// A seekable upload with an optional display name.
pub trait Upload: Read + Seek {
    fn display_name(&self) -> Option<&str>;
}

/// An uploaded document held in memory.
#[derive(Debug, Clone)]
pub struct Document {
    name: Option<String>,
    data: Cursor<Vec<u8>>,
}

impl Document {
    pub fn new(name: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name,
            data: Cursor::new(bytes),
        }
    }

    pub fn named(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(Some(name.into()), bytes.into())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.get_ref().is_empty()
    }
}

impl Read for Document {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl Seek for Document {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.data.seek(pos)
    }
}

impl Upload for Document {
    fn display_name(&self) -> Option<&str> {
        self.name()
    }
}

/// `true` when `file_name` ends with one of [`ACCEPTED_EXTENSIONS`] (case-insensitive).
pub fn is_accepted_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|a| a.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Decodes UTF-8, silently dropping every invalid byte sequence.
pub fn decode_lossy(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                // `valid_up_to` guarantees this prefix is UTF-8.
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(bad) => bytes = &rest[bad..],
                    // Truncated sequence at the end of input.
                    None => return out,
                }
            }
        }
    }
}

fn read_bytes<R: Read + Seek + ?Sized>(handle: &mut R) -> io::Result<Vec<u8>> {
    handle.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    handle.read_to_end(&mut buf)?;
    handle.seek(SeekFrom::Start(0))?;
    Ok(buf)
}

/// Reads the whole handle as text and rewinds it.
pub fn read_text<R: Read + Seek + ?Sized>(handle: &mut R) -> io::Result<String> {
    Ok(decode_lossy(&read_bytes(handle)?))
}

/// Decoded text of every upload, in input order.
pub fn read_all<U: Upload>(uploads: &mut [U]) -> io::Result<Vec<String>> {
    uploads.iter_mut().map(|u| read_text(u)).collect()
}

/// Concatenates the decoded text of all uploads into one corpus.
///
/// With `tag_names`, each named upload is preceded by a `--- <name> ---` line.
///
/// # Example
/// ```
/// use policy_analyst::ingest::{Document, merge_documents};
///
/// let mut docs = vec![
///     Document::named("a.txt", "Dental excluded."),
///     Document::named("b.txt", "Surgery covered."),
/// ];
/// let corpus = merge_documents(&mut docs, true).unwrap();
/// assert!(corpus.find("a.txt").unwrap() < corpus.find("b.txt").unwrap());
/// ```
pub fn merge_documents<U: Upload>(uploads: &mut [U], tag_names: bool) -> io::Result<String> {
    let mut corpus = String::new();
    for upload in uploads.iter_mut() {
        let text = read_text(upload)?;
        if tag_names {
            if let Some(name) = upload.display_name() {
                corpus.push_str(&format!("--- {name} ---\n"));
            }
        }
        corpus.push_str(&text);
        if !corpus.ends_with('\n') {
            corpus.push('\n');
        }
    }

    debug!(
        documents = uploads.len(),
        corpus_chars = corpus.chars().count(),
        "merged uploads"
    );
    Ok(corpus)
}

/// Stable digest of an ordered upload set (names and bytes).
///
/// Used as the cache key for summaries: any change to the set, its order,
/// or a document's content yields a different value.
pub fn fingerprint<U: Upload>(uploads: &mut [U]) -> io::Result<String> {
    let mut hasher = Sha256::new();
    for upload in uploads.iter_mut() {
        let bytes = read_bytes(upload)?;
        let name = upload.display_name().unwrap_or_default();
        hasher.update((name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sequences_are_dropped() {
        let bytes = b"Cover\xffage \xe2\x82\xacok\xe2\x82";
        assert_eq!(decode_lossy(bytes), "Coverage €ok");
        assert_eq!(decode_lossy(b""), "");
    }

    #[test]
    fn read_text_rewinds_the_handle() {
        let mut doc = Document::named("p.txt", "Policy text");
        assert_eq!(read_text(&mut doc).unwrap(), "Policy text");
        assert_eq!(read_text(&mut doc).unwrap(), "Policy text");
        assert_eq!(doc.stream_position().unwrap(), 0);
    }

    #[test]
    fn read_text_starts_from_zero_even_after_partial_read() {
        let mut doc = Document::named("p.txt", "abcdef");
        let mut two = [0u8; 2];
        doc.read_exact(&mut two).unwrap();
        assert_eq!(read_text(&mut doc).unwrap(), "abcdef");
    }

    #[test]
    fn merge_preserves_order_and_tags_each_name_once() {
        let mut docs = vec![
            Document::named("first.txt", "Policy excludes dental."),
            Document::named("second.pdf", "Covers surgery up to $50,000."),
        ];
        let corpus = merge_documents(&mut docs, true).unwrap();

        let a = corpus.find("--- first.txt ---").unwrap();
        let b = corpus.find("--- second.pdf ---").unwrap();
        assert!(a < b);
        assert_eq!(corpus.matches("first.txt").count(), 1);
        assert_eq!(corpus.matches("second.pdf").count(), 1);
        assert!(corpus.find("dental").unwrap() < b);
    }

    #[test]
    fn merge_without_tags_or_names_has_no_headers() {
        let mut docs = vec![
            Document::new(None, b"one".to_vec()),
            Document::named("x.txt", "two"),
        ];
        assert_eq!(merge_documents(&mut docs, false).unwrap(), "one\ntwo\n");

        let mut docs = vec![Document::new(None, b"one".to_vec())];
        assert_eq!(merge_documents(&mut docs, true).unwrap(), "one\n");
    }

    #[test]
    fn binary_payload_decodes_without_failing() {
        let mut docs = vec![Document::named("scan.pdf", vec![0xff_u8, 0xfe, 0xfd])];
        let corpus = merge_documents(&mut docs, true).unwrap();
        assert_eq!(corpus, "--- scan.pdf ---\n");
    }

    #[test]
    fn fingerprint_tracks_content_and_order() {
        let mut a = vec![Document::named("a", "1"), Document::named("b", "2")];
        let mut same = vec![Document::named("a", "1"), Document::named("b", "2")];
        let mut swapped = vec![Document::named("b", "2"), Document::named("a", "1")];
        let mut edited = vec![Document::named("a", "1"), Document::named("b", "3")];

        let fa = fingerprint(&mut a).unwrap();
        assert_eq!(fa, fingerprint(&mut same).unwrap());
        assert_ne!(fa, fingerprint(&mut swapped).unwrap());
        assert_ne!(fa, fingerprint(&mut edited).unwrap());
        assert_eq!(read_text(&mut a[0]).unwrap(), "1");
    }

    #[test]
    fn accepted_extensions() {
        assert!(is_accepted_file("policy.TXT"));
        assert!(is_accepted_file("scan.pdf"));
        assert!(!is_accepted_file("image.png"));
        assert!(!is_accepted_file("README"));
    }
}
