//! Admission checks for uploaded résumé files.

use thiserror::Error;

pub const REQUIRED_EXTENSION: &str = ".pdf";
pub const REQUIRED_CONTENT_TYPE: &str = "application/pdf";
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Multipart clients that don't know the type send this; fall back to the filename.
const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

/// Marker of a PDF encryption dictionary in the trailer.
const ENCRYPT_MARKER: &[u8] = b"/Encrypt";
const STARTXREF: &[u8] = b"startxref";
/// How much of the file's end is searched when `startxref` can't be followed.
const TRAILER_WINDOW: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("File is {actual} bytes, the maximum allowed is {max} bytes")]
    SizeExceeded { actual: usize, max: usize },

    #[error("Only PDF files are accepted (got '{0}')")]
    BadExtension(String),

    #[error("Unsupported content type '{0}', please upload a PDF file")]
    BadContentType(String),

    #[error("File content is not a valid PDF document")]
    BadMagicHeader,

    #[error("Encrypted PDF files cannot be processed")]
    Encrypted,
}

impl GateRejection {
    pub fn code(&self) -> &'static str {
        match self {
            GateRejection::SizeExceeded { .. } => "size_exceeded",
            GateRejection::BadExtension(_) => "bad_extension",
            GateRejection::BadContentType(_) => "bad_content_type",
            GateRejection::BadMagicHeader => "bad_magic_header",
            GateRejection::Encrypted => "encrypted",
        }
    }
}

/// What the client told us about the file, next to the bytes themselves.
#[derive(Debug, Clone, Copy)]
pub struct Declared<'a> {
    pub filename: &'a str,
    pub size: Option<usize>,
    pub content_type: Option<&'a str>,
}

/// Checks that `blob` is an acceptable PDF. Short-circuits on the first failure:
///
/// 1. size (the larger of declared and actual) ≤ `max_bytes`
/// 2. filename ends in `.pdf`
/// 3. declared content type, or the type guessed from the filename, is `application/pdf`
/// 4. the blob starts with `%PDF-`
/// 5. the trailer carries no `/Encrypt` entry
///
/// Only borrows the blob; nothing is consumed.
pub fn validate(blob: &[u8], declared: Declared<'_>, max_bytes: usize) -> Result<(), GateRejection> {
    let actual = declared.size.unwrap_or(0).max(blob.len());
    if actual > max_bytes {
        return Err(GateRejection::SizeExceeded {
            actual,
            max: max_bytes,
        });
    }

    if !declared
        .filename
        .to_ascii_lowercase()
        .ends_with(REQUIRED_EXTENSION)
    {
        return Err(GateRejection::BadExtension(declared.filename.to_string()));
    }

    let content_type = effective_content_type(declared.filename, declared.content_type);
    if content_type != REQUIRED_CONTENT_TYPE {
        return Err(GateRejection::BadContentType(content_type));
    }

    if !blob.starts_with(PDF_MAGIC) {
        return Err(GateRejection::BadMagicHeader);
    }

    if find(trailer_section(blob), ENCRYPT_MARKER).is_some() {
        return Err(GateRejection::Encrypted);
    }

    Ok(())
}

fn effective_content_type(filename: &str, declared: Option<&str>) -> String {
    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != GENERIC_CONTENT_TYPE);

    declared.unwrap_or_else(|| {
        mime_guess::from_path(filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    })
}

/// The bytes that can hold the trailer dictionary: from the offset named by the
/// last `startxref` up to that keyword, cut before any stream data. Falls back to
/// the file's tail when the offset is missing or out of range.
fn trailer_section(blob: &[u8]) -> &[u8] {
    let tail = &blob[blob.len().saturating_sub(TRAILER_WINDOW)..];
    let Some(marker) = rfind(blob, STARTXREF) else {
        return tail;
    };

    let digits: String = blob[marker + STARTXREF.len()..]
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .map(|&b| b as char)
        .collect();
    match digits.parse::<usize>() {
        Ok(offset) if offset < marker => {
            let section = &blob[offset..marker];
            // An xref stream keeps its dictionary in front of the binary data.
            match find(section, b"stream") {
                Some(end) => &section[..end],
                None => section,
            }
        }
        _ => tail,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 10 * 1024 * 1024;
    const MINIMAL_PDF: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF";

    fn declared(name: &str) -> Declared<'_> {
        Declared {
            filename: name,
            size: None,
            content_type: None,
        }
    }

    #[test]
    fn test_accepts_minimal_pdf() {
        assert_eq!(validate(MINIMAL_PDF, declared("resume.pdf"), MAX), Ok(()));
    }

    #[test]
    fn test_accepts_uppercase_extension() {
        assert!(validate(MINIMAL_PDF, declared("CV.PDF"), MAX).is_ok());
    }

    #[test]
    fn test_rejects_hello_named_pdf_by_magic_header() {
        assert_eq!(
            validate(b"hello", declared("x.pdf"), MAX),
            Err(GateRejection::BadMagicHeader)
        );
    }

    #[test]
    fn test_rejects_oversized_blob() {
        let r = validate(MINIMAL_PDF, declared("resume.pdf"), 10);
        assert!(matches!(r, Err(GateRejection::SizeExceeded { max: 10, .. })));
    }

    #[test]
    fn test_declared_size_counts_even_if_blob_is_small() {
        let d = Declared {
            size: Some(MAX + 1),
            ..declared("resume.pdf")
        };
        assert!(matches!(
            validate(MINIMAL_PDF, d, MAX),
            Err(GateRejection::SizeExceeded { .. })
        ));
    }

    #[test]
    fn test_size_checked_before_extension() {
        let r = validate(b"hello world", declared("notes.txt"), 4);
        assert!(matches!(r, Err(GateRejection::SizeExceeded { .. })));
    }

    #[test]
    fn test_rejects_wrong_extension() {
        assert_eq!(
            validate(MINIMAL_PDF, declared("resume.docx"), MAX),
            Err(GateRejection::BadExtension("resume.docx".to_string()))
        );
    }

    #[test]
    fn test_rejects_declared_non_pdf_content_type() {
        let d = Declared {
            content_type: Some("text/plain"),
            ..declared("resume.pdf")
        };
        assert_eq!(
            validate(MINIMAL_PDF, d, MAX),
            Err(GateRejection::BadContentType("text/plain".to_string()))
        );
    }

    #[test]
    fn test_octet_stream_falls_back_to_filename_guess() {
        let d = Declared {
            content_type: Some("application/octet-stream"),
            ..declared("resume.pdf")
        };
        assert!(validate(MINIMAL_PDF, d, MAX).is_ok());
    }

    #[test]
    fn test_content_type_parameters_ignored() {
        let d = Declared {
            content_type: Some("Application/PDF; charset=binary"),
            ..declared("resume.pdf")
        };
        assert!(validate(MINIMAL_PDF, d, MAX).is_ok());
    }

    #[test]
    fn test_rejects_encrypted_pdf() {
        let blob = b"%PDF-1.7\ntrailer << /Root 1 0 R /Encrypt 5 0 R >>\n%%EOF";
        assert_eq!(
            validate(blob, declared("locked.pdf"), MAX),
            Err(GateRejection::Encrypted)
        );
    }

    const CATALOG: &str = "%PDF-1.5\n1 0 obj << /Type /Catalog >> endobj\n";

    #[test]
    fn test_encrypt_word_in_content_stream_is_accepted() {
        let body = format!(
            "{CATALOG}2 0 obj << /Length 24 >> stream\n(/Encrypt your data) Tj\nendstream endobj\n"
        );
        let blob = format!(
            "{body}xref\n0 3\n0000000000 65535 f \ntrailer << /Size 3 /Root 1 0 R >>\nstartxref\n{}\n%%EOF",
            body.len()
        );
        assert_eq!(validate(blob.as_bytes(), declared("resume.pdf"), MAX), Ok(()));
    }

    #[test]
    fn test_rejects_encrypt_in_classic_trailer() {
        let blob = format!(
            "{CATALOG}xref\n0 2\ntrailer << /Size 2 /Root 1 0 R /Encrypt 4 0 R >>\nstartxref\n{}\n%%EOF",
            CATALOG.len()
        );
        assert_eq!(
            validate(blob.as_bytes(), declared("locked.pdf"), MAX),
            Err(GateRejection::Encrypted)
        );
    }

    #[test]
    fn test_rejects_encrypt_in_xref_stream_dictionary() {
        let blob = format!(
            "{CATALOG}5 0 obj << /Type /XRef /Size 6 /Root 1 0 R /Encrypt 4 0 R /Length 0 >> stream\n\nendstream endobj\nstartxref\n{}\n%%EOF",
            CATALOG.len()
        );
        assert_eq!(
            validate(blob.as_bytes(), declared("locked.pdf"), MAX),
            Err(GateRejection::Encrypted)
        );
    }

    #[test]
    fn test_bogus_startxref_falls_back_to_tail() {
        let blob = b"%PDF-1.7\ntrailer << /Root 1 0 R /Encrypt 5 0 R >>\nstartxref\n999999\n%%EOF";
        assert_eq!(
            validate(blob, declared("locked.pdf"), MAX),
            Err(GateRejection::Encrypted)
        );
    }

    #[test]
    fn test_rejection_codes() {
        assert_eq!(GateRejection::BadMagicHeader.code(), "bad_magic_header");
        assert_eq!(GateRejection::Encrypted.code(), "encrypted");
    }
}
