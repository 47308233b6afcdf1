//! Request/response adapter for upload handlers.
//!
//! Framework-agnostic: the caller pulls the uploaded part out of its request type,
//! calls [`handle_upload`], and copies the [`Reply`] into its response type.

use serde_json::json;

use crate::{strip_with_options, ErrorKind, StripError, StripOptions};

/// An uploaded image as received from a multipart form.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    /// File contents; `None` when the form had no file part.
    pub bytes: Option<Vec<u8>>,
    /// Content type sent by the client, if any.
    pub media_type: Option<String>,
    /// Original filename sent by the client, if any.
    pub file_name: Option<String>,
}

/// Status, headers and body to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    /// First header value with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn json_error(status: u16, kind: Option<ErrorKind>, message: String) -> Self {
        let body = json!({
            "error": message,
            "kind": kind.map(ErrorKind::as_str),
        });
        Self {
            status,
            headers: vec![("Content-Type", "application/json".to_string())],
            body: body.to_string().into_bytes(),
        }
    }
}

/// HTTP status for an error kind: client errors for bad input, 500 otherwise.
pub fn status_for(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::InputEmpty | ErrorKind::UnsupportedFormat => 400,
        ErrorKind::InputTooLarge => 413,
        ErrorKind::InvalidContainer | ErrorKind::Internal => 500,
    }
}

/// Strip an uploaded image and build the download response.
///
/// Success: 200 with the cleaned bytes, `Content-Type`, `Content-Disposition`
/// (attachment, `cleaned_<name>`) and `Content-Length`.
/// Failure: JSON body `{"error": "...", "kind": "..."}`.
pub fn handle_upload(upload: Upload, options: &StripOptions) -> Reply {
    let Some(bytes) = upload.bytes else {
        return Reply::json_error(400, None, "No image file found in request".to_string());
    };

    match strip_with_options(
        &bytes,
        upload.media_type.as_deref(),
        upload.file_name.as_deref(),
        options,
    ) {
        Ok(cleaned) => {
            let headers = vec![
                ("Content-Type", cleaned.media_type.to_string()),
                (
                    "Content-Disposition",
                    format!(
                        "attachment; filename=\"{}\"",
                        cleaned.file_name.replace('"', "")
                    ),
                ),
                ("Content-Length", cleaned.data.len().to_string()),
            ];
            Reply {
                status: 200,
                headers,
                body: cleaned.data,
            }
        }
        Err(e) => error_reply(&e),
    }
}

fn error_reply(e: &StripError) -> Reply {
    let status = status_for(e.kind());
    if status >= 500 {
        tracing::error!(kind = e.kind().as_str(), "upload failed: {}", e);
    } else {
        tracing::info!(kind = e.kind().as_str(), "upload rejected: {}", e);
    }
    Reply::json_error(status, Some(e.kind()), e.to_string())
}
