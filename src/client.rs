//! Talking to the signing service.

use crate::config::SignerConfig;
use crate::error::{Error, ServiceError};
use crate::request::{SignatureRequest, Upload};
use bytes::Bytes;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::CONTENT_DISPOSITION;
use serde::Deserialize;
use std::io::Cursor;

/// The signed document returned by the service.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedDocument {
    file_name: Option<String>,
    bytes: Bytes,
}

impl SignedDocument {
    pub fn new(file_name: Option<String>, bytes: impl Into<Bytes>) -> Self {
        SignedDocument {
            file_name,
            bytes: bytes.into(),
        }
    }

    /// File name suggested by the service, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Name to save the result under: the service's suggestion, or the
    /// source name with a `signed_` prefix.
    pub fn download_name(&self, source_file_name: &str) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => format!("signed_{}", source_file_name),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl std::fmt::Debug for SignedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedDocument")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub trait SigningService {
    /// Make exactly one attempt to sign the request.
    fn sign(&self, request: &SignatureRequest) -> Result<SignedDocument, Error>;
}

pub struct HttpSigningClient {
    service_url: String,
    http_client: reqwest::blocking::Client,
}

impl HttpSigningClient {
    pub fn new(config: &SignerConfig) -> Result<Self, Error> {
        let mut builder = reqwest::blocking::Client::builder().timeout(config.request_timeout);
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        Ok(HttpSigningClient {
            service_url: config.service_url.clone(),
            http_client: builder.build()?,
        })
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    fn form(request: &SignatureRequest) -> Result<Form, Error> {
        Ok(Form::new()
            .part("file", file_part(request.source(), "application/pdf")?)
            .part(
                "private_key",
                file_part(request.credential(), "application/octet-stream")?,
            )
            .text("password", request.passphrase().to_owned())
            .text("signatures", request.signatures_json()?)
            .text("user_id", request.user_id().to_owned()))
    }
}

impl SigningService for HttpSigningClient {
    fn sign(&self, request: &SignatureRequest) -> Result<SignedDocument, Error> {
        log::info!(
            "Sending `{}` with {} signature(s) to `{}` for user `{}`.",
            request.source().file_name(),
            request.placements().len(),
            self.service_url,
            request.user_id()
        );
        let response = self
            .http_client
            .post(&self.service_url)
            .multipart(Self::form(request)?)
            .send()
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_file_name);
        let body = response
            .bytes()
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        let signed = interpret_response(status, file_name, body)?;
        log::info!(
            "Signing service returned {} bytes for `{}`.",
            signed.bytes().len(),
            request.source().file_name()
        );
        Ok(signed)
    }
}

fn file_part(upload: &Upload, mime: &str) -> Result<Part, Error> {
    let length = u64::try_from(upload.len())?;
    Ok(
        Part::reader_with_length(Cursor::new(upload.bytes().clone()), length)
            .file_name(upload.file_name().to_owned())
            .mime_str(mime)?,
    )
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Turn a status and body into the signed document or an error message.
pub(crate) fn interpret_response(
    status: u16,
    file_name: Option<String>,
    body: Bytes,
) -> Result<SignedDocument, ServiceError> {
    if (200..300).contains(&status) {
        return Ok(SignedDocument::new(file_name, body));
    }
    let message = error_detail(&body).unwrap_or_else(|| {
        format!(
            "The signing service answered with status {} and no usable error detail.",
            status
        )
    });
    log::warn!("Signing failed with status {}: {}", status, message);
    Err(ServiceError::Rejected { status, message })
}

/// Pull a readable message out of `{"detail": ...}`. FastAPI sends a string
/// for handled errors and a list of `{"msg": ...}` for validation errors.
fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    let message = match parsed.detail? {
        serde_json::Value::String(text) => text,
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(text) => Some(text.clone()),
                other => other.get("msg").and_then(|msg| msg.as_str()).map(str::to_owned),
            })
            .collect::<Vec<String>>()
            .join("; "),
        serde_json::Value::Null => return None,
        other => other.to_string(),
    };
    let message = message.trim().to_owned();
    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}

/// `attachment; filename=signed.pdf` -> `signed.pdf`
fn attachment_file_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_owned())
        .filter(|name| !name.is_empty())
}
