//! Multipart form-data parsing for file uploads.
//!
//! Provides [`parse_multipart`] to extract form fields and uploaded files
//! from `multipart/form-data` request bodies. Parsing works on bytes so file
//! content is kept exactly as sent. No size ceiling is applied here: file
//! size limits are a validator concern of the form layer.

use indexmap::IndexMap;
use mdform_core::{MdFormError, MdFormResult};

/// An uploaded file from a multipart form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The original filename as provided by the client.
    pub name: String,
    /// The MIME content type of the file.
    pub content_type: String,
    /// The raw file content.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Creates an uploaded file from its parts.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// The size of the file content in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// The lower-cased filename extension, without the dot.
    ///
    /// ```
    /// use mdform_http::UploadedFile;
    ///
    /// let file = UploadedFile::new("Scan.PDF", "application/pdf", b"%PDF".to_vec());
    /// assert_eq!(file.extension().as_deref(), Some("pdf"));
    /// ```
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

/// The result of parsing a multipart form-data body.
#[derive(Debug, Clone, Default)]
pub struct MultipartData {
    /// Regular form fields: name -> list of values.
    pub fields: IndexMap<String, Vec<String>>,
    /// Uploaded files: field name -> list of uploaded files.
    pub files: IndexMap<String, Vec<UploadedFile>>,
}

/// Extracts the boundary string from a `Content-Type: multipart/form-data` header.
///
/// Returns `None` if the boundary cannot be found.
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("boundary="))
        .map(|boundary| boundary.trim_matches('"'))
        .find(|boundary| !boundary.is_empty())
}

/// Parses a multipart/form-data request body.
///
/// Splits the body on the boundary delimiter, then reads each part's
/// `Content-Disposition` header to decide whether the part is a regular
/// form field or a file upload. File inputs left empty by the browser
/// (no filename, no content) are skipped.
pub fn parse_multipart(body: &[u8], boundary: &str) -> MdFormResult<MultipartData> {
    if boundary.is_empty() {
        return Err(MdFormError::BadRequest("Empty multipart boundary".into()));
    }

    let mut data = MultipartData::default();
    let delimiter = format!("--{boundary}");

    for part in split_on(body, delimiter.as_bytes()) {
        let part = trim_line_break_start(part);
        if part.is_empty() || part.starts_with(b"--") {
            continue;
        }

        let Some((headers, content)) = split_headers(part) else {
            continue;
        };
        let content = trim_line_break_end(content);

        let headers = String::from_utf8_lossy(headers);
        let mut field_name = None;
        let mut filename = None;
        let mut part_content_type = "text/plain".to_string();

        for header_line in headers.lines() {
            let Some((name, value)) = header_line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if name.trim().eq_ignore_ascii_case("content-disposition") {
                field_name = extract_header_param(value, "name");
                filename = extract_header_param(value, "filename");
            } else if name.trim().eq_ignore_ascii_case("content-type") {
                part_content_type = value.to_string();
            }
        }

        let Some(name) = field_name else {
            continue;
        };

        if let Some(fname) = filename {
            if fname.is_empty() && content.is_empty() {
                continue;
            }
            tracing::debug!(field = %name, file = %fname, size = content.len(), "multipart file part");
            data.files
                .entry(name)
                .or_default()
                .push(UploadedFile::new(fname, part_content_type, content));
        } else {
            data.fields
                .entry(name)
                .or_default()
                .push(String::from_utf8_lossy(content).into_owned());
        }
    }

    Ok(data)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn split_on<'a>(mut body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    while let Some(pos) = find(body, delimiter) {
        parts.push(&body[..pos]);
        body = &body[pos + delimiter.len()..];
    }
    parts.push(body);
    parts
}

fn split_headers(part: &[u8]) -> Option<(&[u8], &[u8])> {
    if let Some(pos) = find(part, b"\r\n\r\n") {
        Some((&part[..pos], &part[pos + 4..]))
    } else {
        find(part, b"\n\n").map(|pos| (&part[..pos], &part[pos + 2..]))
    }
}

fn trim_line_break_start(part: &[u8]) -> &[u8] {
    part.strip_prefix(b"\r\n")
        .or_else(|| part.strip_prefix(b"\n"))
        .unwrap_or(part)
}

fn trim_line_break_end(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}

/// Extracts a parameter value from a header value string.
///
/// For example, from `form-data; name="field1"; filename="file.txt"`,
/// `extract_header_param(value, "name")` returns `Some("field1")`.
fn extract_header_param(header_value: &str, param_name: &str) -> Option<String> {
    header_value.split(';').find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        (key.trim() == param_name).then(|| value.trim().trim_matches('"').to_string())
    })
}
