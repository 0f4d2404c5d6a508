//! The request type consumed by the form orchestrator.
//!
//! [`FormRequest`] carries what the request cycle needs from an incoming HTTP
//! request: the method, the endpoint name and view arguments the router
//! resolved, the submitted form data and files, and the flash message store.
//! Routing itself belongs to the embedding application.

use http::Method;
use indexmap::IndexMap;

use crate::messages::Message;
use crate::querydict::QueryDict;
use crate::upload::{self, UploadedFile};

/// A request as seen by the form orchestrator.
///
/// # Examples
///
/// ```
/// use mdform_http::FormRequest;
///
/// let request = FormRequest::builder()
///     .method(http::Method::POST)
///     .endpoint("forms.contact")
///     .content_type("application/x-www-form-urlencoded")
///     .body(b"name=John+Smith".to_vec())
///     .build();
///
/// assert!(request.is_submission());
/// assert_eq!(request.post().get("name"), Some("John Smith"));
/// ```
#[derive(Debug, Clone)]
pub struct FormRequest {
    method: Method,
    endpoint: String,
    view_args: IndexMap<String, String>,
    content_type: Option<String>,
    post: QueryDict,
    files: IndexMap<String, Vec<UploadedFile>>,
    messages: Vec<Message>,
}

impl FormRequest {
    /// Creates a new [`FormRequestBuilder`].
    pub fn builder() -> FormRequestBuilder {
        FormRequestBuilder::default()
    }

    /// Creates a `FormRequest` from `http` request parts and the body bytes.
    ///
    /// The endpoint and view arguments are left empty for the router to fill in.
    pub fn from_parts(parts: &http::request::Parts, body: Vec<u8>) -> Self {
        let mut builder = Self::builder().method(parts.method.clone()).body(body);
        if let Some(ct) = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            builder = builder.content_type(ct);
        }
        builder.build()
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns `true` for methods that submit form data (POST, PUT, PATCH, DELETE).
    pub fn is_submission(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    /// Returns the resolved endpoint name (e.g. `"forms.contact"`).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sets the resolved endpoint name.
    pub fn set_endpoint(&mut self, endpoint: &str) {
        self.endpoint = endpoint.to_string();
    }

    /// Returns the view arguments extracted by the router.
    pub const fn view_args(&self) -> &IndexMap<String, String> {
        &self.view_args
    }

    /// Returns a single view argument.
    pub fn view_arg(&self, name: &str) -> Option<&str> {
        self.view_args.get(name).map(String::as_str)
    }

    /// Returns the content type of the request body, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the submitted form parameters.
    pub const fn post(&self) -> &QueryDict {
        &self.post
    }

    /// Returns the uploaded files, keyed by field name.
    pub const fn files(&self) -> &IndexMap<String, Vec<UploadedFile>> {
        &self.files
    }

    /// Returns the first uploaded file for a field.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).and_then(|files| files.first())
    }

    /// Returns the pending flash messages.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the flash message store.
    pub fn messages_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }
}

/// Builder for constructing [`FormRequest`] instances.
#[derive(Debug)]
pub struct FormRequestBuilder {
    method: Method,
    endpoint: String,
    view_args: IndexMap<String, String>,
    content_type: Option<String>,
    body: Vec<u8>,
    post: QueryDict,
    files: IndexMap<String, Vec<UploadedFile>>,
}

impl Default for FormRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            endpoint: String::new(),
            view_args: IndexMap::new(),
            content_type: None,
            body: Vec::new(),
            post: QueryDict::new(),
            files: IndexMap::new(),
        }
    }
}

impl FormRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the endpoint name.
    #[must_use]
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Adds a view argument.
    #[must_use]
    pub fn view_arg(mut self, name: &str, value: &str) -> Self {
        self.view_args.insert(name.to_string(), value.to_string());
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, ct: &str) -> Self {
        self.content_type = Some(ct.to_string());
        self
    }

    /// Sets the raw request body, parsed on [`build`](Self::build) per the content type.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Adds an already-decoded form value.
    #[must_use]
    pub fn post_value(mut self, name: &str, value: &str) -> Self {
        self.post.append(name, value);
        self
    }

    /// Adds an already-decoded uploaded file.
    #[must_use]
    pub fn file(mut self, name: &str, file: UploadedFile) -> Self {
        self.files.entry(name.to_string()).or_default().push(file);
        self
    }

    /// Builds the [`FormRequest`].
    ///
    /// A body that fails to parse as multipart is logged and ignored.
    pub fn build(self) -> FormRequest {
        let mut post = self.post;
        let mut files = self.files;

        match self.content_type.as_deref() {
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
                let parsed = QueryDict::parse(&String::from_utf8_lossy(&self.body));
                for (name, values) in parsed.iter() {
                    for value in values {
                        post.append(name, value);
                    }
                }
            }
            Some(ct) if ct.starts_with("multipart/form-data") => {
                match upload::extract_boundary(ct).map(|b| upload::parse_multipart(&self.body, b)) {
                    Some(Ok(multipart)) => {
                        for (name, values) in &multipart.fields {
                            for value in values {
                                post.append(name, value);
                            }
                        }
                        for (name, uploaded) in multipart.files {
                            files.entry(name).or_default().extend(uploaded);
                        }
                    }
                    Some(Err(e)) => tracing::warn!(error = %e, "ignoring malformed multipart body"),
                    None => tracing::warn!("multipart body without boundary"),
                }
            }
            _ => {}
        }

        FormRequest {
            method: self.method,
            endpoint: self.endpoint,
            view_args: self.view_args,
            content_type: self.content_type,
            post,
            files,
            messages: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let req = FormRequest::builder().build();
        assert_eq!(req.method(), &Method::GET);
        assert!(!req.is_submission());
        assert_eq!(req.endpoint(), "");
        assert!(req.content_type().is_none());
        assert!(req.post().is_empty());
        assert!(req.files().is_empty());
    }

    #[test]
    fn test_urlencoded_body() {
        let req = FormRequest::builder()
            .method(Method::POST)
            .content_type("application/x-www-form-urlencoded; charset=utf-8")
            .body(b"name=John+Smith&email=john%40smith.com".to_vec())
            .build();
        assert!(req.is_submission());
        assert_eq!(req.post().get("name"), Some("John Smith"));
        assert_eq!(req.post().get("email"), Some("john@smith.com"));
    }

    #[test]
    fn test_multipart_body() {
        let body = "--xyz\r\n\
                    Content-Disposition: form-data; name=\"title\"\r\n\r\n\
                    Report\r\n\
                    --xyz\r\n\
                    Content-Disposition: form-data; name=\"file_field\"; filename=\"r.txt\"\r\n\
                    Content-Type: text/plain\r\n\r\n\
                    hello\r\n\
                    --xyz--\r\n";
        let req = FormRequest::builder()
            .method(Method::POST)
            .content_type("multipart/form-data; boundary=xyz")
            .body(body.as_bytes().to_vec())
            .build();
        assert_eq!(req.post().get("title"), Some("Report"));
        assert_eq!(req.file("file_field").map(|f| f.name.as_str()), Some("r.txt"));
    }

    #[test]
    fn test_view_args_and_endpoint() {
        let mut req = FormRequest::builder()
            .view_arg("mdfile", "surveys/intro")
            .build();
        assert_eq!(req.view_arg("mdfile"), Some("surveys/intro"));
        assert_eq!(req.view_arg("missing"), None);
        req.set_endpoint("forms.intro");
        assert_eq!(req.endpoint(), "forms.intro");
    }

    #[test]
    fn test_from_parts() {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(())
            .unwrap()
            .into_parts();
        let req = FormRequest::from_parts(&parts, b"a=1".to_vec());
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.post().get("a"), Some("1"));
    }
}
