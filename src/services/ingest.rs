//! Project-creation request ingestion.
//!
//! A creation request may arrive as `multipart/form-data`, as a URL-encoded
//! form, or as a JSON document. Ingestion tries a fixed list of strategies,
//! richest first, and keeps the first form it can extract:
//!
//! 1. [`IngestStrategy::NativeFormData`]: `FormData` semantics over
//!    multipart and URL-encoded bodies.
//! 2. [`IngestStrategy::LegacyMultipart`]: lenient conversion of raw
//!    multipart parts.
//! 3. [`IngestStrategy::RawBody`]: JSON object or URL-encoded text.
//!
//! Validation of the resulting form is terminal: a missing title never
//! triggers another strategy.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use actix_multipart::Multipart;
use actix_web::HttpRequest;
use actix_web::error::PayloadError;
use actix_web::http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use actix_web::web::Bytes;
use futures_util::StreamExt;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Message returned when the title is missing or blank.
pub const TITLE_REQUIRED: &str = "Title is required";

const MULTIPART_FORM_DATA: &str = "multipart/form-data";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const OCTET_STREAM: &str = "application/octet-stream";

/// Buffered transport input of a creation request.
#[derive(Debug, Clone)]
pub struct RawRequest {
    content_type: Option<String>,
    body: Bytes,
}

impl RawRequest {
    pub fn new(content_type: Option<&str>, body: Bytes) -> Self {
        Self {
            content_type: content_type.map(str::to_string),
            body,
        }
    }

    pub fn from_http(req: &HttpRequest, body: Bytes) -> Self {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        Self::new(content_type, body)
    }

    /// Lower-cased content type without parameters.
    fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    fn is_json(&self) -> bool {
        self.media_type()
            .is_some_and(|mt| mt == "application/json" || mt.ends_with("+json"))
    }
}

/// An uploaded file value.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadedFile {
    /// What browsers send for a file input left empty.
    fn is_blank(&self) -> bool {
        self.data.is_empty() && self.filename.as_deref().unwrap_or_default().is_empty()
    }
}

/// A single form value.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File(UploadedFile),
    /// A non-string JSON value from a JSON body.
    Other(JsonValue),
}

/// Key to value lookup produced by every strategy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormAccessor {
    entries: HashMap<String, FormValue>,
}

impl FormAccessor {
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries.get(name)
    }

    /// Set a value, replacing an earlier one.
    pub fn set(&mut self, name: impl Into<String>, value: FormValue) {
        self.entries.insert(name.into(), value);
    }

    /// Add a value unless the key is already present (`FormData.get` returns the first).
    pub fn append(&mut self, name: impl Into<String>, value: FormValue) {
        if let Entry::Vacant(slot) = self.entries.entry(name.into()) {
            slot.insert(value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take(&mut self, name: &str) -> Option<FormValue> {
        self.entries.remove(name)
    }
}

/// One part of a multipart body, as delivered by the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    pub name: Option<String>,
    pub data: Bytes,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// Why a strategy could not produce a form.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("malformed body: {0}")]
    Malformed(String),

    #[error("field {0} is not valid UTF-8")]
    InvalidUtf8(String),
}

/// Normalized creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub file: Option<UploadedFile>,
}

/// Form extraction strategies, in the order they are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStrategy {
    NativeFormData,
    LegacyMultipart,
    RawBody,
}

impl IngestStrategy {
    pub const DEFAULT_ORDER: [IngestStrategy; 3] = [
        IngestStrategy::NativeFormData,
        IngestStrategy::LegacyMultipart,
        IngestStrategy::RawBody,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativeFormData => "native-form-data",
            Self::LegacyMultipart => "legacy-multipart",
            Self::RawBody => "raw-body",
        }
    }

    pub async fn extract(&self, req: &RawRequest) -> Result<FormAccessor, IngestError> {
        match self {
            Self::NativeFormData => native_form_data(req).await,
            Self::LegacyMultipart => legacy_multipart(req).await,
            Self::RawBody => raw_body(req),
        }
    }
}

/// Ordered list of strategies; the first success wins.
#[derive(Debug, Clone)]
pub struct IngestChain {
    strategies: Vec<IngestStrategy>,
}

impl Default for IngestChain {
    fn default() -> Self {
        Self::new(IngestStrategy::DEFAULT_ORDER.to_vec())
    }
}

impl IngestChain {
    pub fn new(strategies: Vec<IngestStrategy>) -> Self {
        Self { strategies }
    }

    /// Extract a form, falling back through the strategies.
    ///
    /// When every strategy fails the form is empty, which then fails title
    /// validation like any other request without a title.
    pub async fn resolve(&self, req: &RawRequest) -> FormAccessor {
        for strategy in &self.strategies {
            match strategy.extract(req).await {
                Ok(form) => {
                    debug!(
                        "Ingested request with {} ({} fields)",
                        strategy.as_str(),
                        form.len()
                    );
                    return form;
                }
                Err(e) => debug!("Strategy {} declined request: {}", strategy.as_str(), e),
            }
        }

        debug!("No ingestion strategy accepted the request");
        FormAccessor::default()
    }

    /// Resolve and validate a creation request.
    pub async fn ingest(&self, req: &RawRequest) -> AppResult<NewProject> {
        normalize(self.resolve(req).await)
    }
}

/// Validate a resolved form into a creation request.
pub fn normalize(mut form: FormAccessor) -> AppResult<NewProject> {
    let title = match form.get("title") {
        Some(FormValue::Text(text)) => text.trim(),
        _ => "",
    };
    if title.is_empty() {
        return Err(AppError::InvalidInput(TITLE_REQUIRED.to_string()));
    }
    let title = title.to_string();

    let file = match form.take("file") {
        Some(FormValue::File(file)) if !file.is_blank() => Some(file),
        _ => None,
    };

    Ok(NewProject { title, file })
}

async fn native_form_data(req: &RawRequest) -> Result<FormAccessor, IngestError> {
    match req.media_type().as_deref() {
        Some(MULTIPART_FORM_DATA) => {
            let mut form = FormAccessor::default();
            for part in read_multipart(req).await? {
                let name = part.name.ok_or_else(|| {
                    IngestError::Malformed("form-data part without a name".to_string())
                })?;
                let value = match part.filename {
                    Some(filename) => FormValue::File(UploadedFile {
                        filename: Some(filename),
                        content_type: part
                            .content_type
                            .unwrap_or_else(|| OCTET_STREAM.to_string()),
                        data: part.data,
                    }),
                    None => FormValue::Text(
                        String::from_utf8(part.data.to_vec())
                            .map_err(|_| IngestError::InvalidUtf8(name.clone()))?,
                    ),
                };
                form.append(name, value);
            }
            Ok(form)
        }
        Some(FORM_URLENCODED) => {
            let text = std::str::from_utf8(&req.body)
                .map_err(|_| IngestError::InvalidUtf8("body".to_string()))?;
            let mut form = FormAccessor::default();
            for (name, value) in parse_urlencoded(text) {
                form.append(name, FormValue::Text(value));
            }
            Ok(form)
        }
        other => Err(IngestError::UnsupportedContentType(
            other.unwrap_or("none").to_string(),
        )),
    }
}

async fn legacy_multipart(req: &RawRequest) -> Result<FormAccessor, IngestError> {
    match req.media_type() {
        Some(mt) if mt.starts_with("multipart/") => Ok(form_from_parts(read_multipart(req).await?)),
        other => Err(IngestError::UnsupportedContentType(
            other.unwrap_or_else(|| "none".to_string()),
        )),
    }
}

/// Convert raw multipart parts: named parts with a file name or a `file`
/// type marker become files, the rest become text. Later parts win.
pub fn form_from_parts(parts: Vec<MultipartPart>) -> FormAccessor {
    let mut form = FormAccessor::default();
    for part in parts {
        let Some(name) = part.name.filter(|n| !n.is_empty()) else {
            continue;
        };

        let is_file = part.filename.is_some() || part.content_type.as_deref() == Some("file");
        let value = if is_file {
            FormValue::File(UploadedFile {
                filename: Some(part.filename.unwrap_or_else(|| "file".to_string())),
                content_type: part
                    .content_type
                    .filter(|ct| !ct.is_empty())
                    .unwrap_or_else(|| OCTET_STREAM.to_string()),
                data: part.data,
            })
        } else {
            FormValue::Text(String::from_utf8_lossy(&part.data).into_owned())
        };
        form.set(name, value);
    }
    form
}

fn raw_body(req: &RawRequest) -> Result<FormAccessor, IngestError> {
    if req.body.is_empty() {
        return Ok(FormAccessor::default());
    }

    let text = String::from_utf8_lossy(&req.body);
    if req.media_type().as_deref() == Some(FORM_URLENCODED) {
        return Ok(form_from_urlencoded(&text));
    }

    if req.is_json() {
        match serde_json::from_str::<JsonValue>(&text) {
            Ok(JsonValue::Object(map)) => return Ok(form_from_json_object(map)),
            // A JSON scalar or array carries no named fields
            Ok(_) => return Ok(FormAccessor::default()),
            Err(_) => {}
        }
    }

    Ok(form_from_text(&text))
}

/// A body of unknown shape: JSON object first, then URL-encoded.
fn form_from_text(text: &str) -> FormAccessor {
    match serde_json::from_str::<JsonMap<String, JsonValue>>(text) {
        Ok(map) => form_from_json_object(map),
        Err(_) => form_from_urlencoded(text),
    }
}

fn form_from_json_object(map: JsonMap<String, JsonValue>) -> FormAccessor {
    let mut form = FormAccessor::default();
    for (name, value) in map {
        let value = match value {
            JsonValue::String(text) => FormValue::Text(text),
            other => FormValue::Other(other),
        };
        form.set(name, value);
    }
    form
}

fn form_from_urlencoded(text: &str) -> FormAccessor {
    let mut form = FormAccessor::default();
    for (name, value) in parse_urlencoded(text) {
        form.set(name, FormValue::Text(value));
    }
    form
}

/// Split `a=1&b=2` into decoded pairs. `+` means space.
fn parse_urlencoded(text: &str) -> Vec<(String, String)> {
    text.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(name), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse a buffered multipart body into its parts.
async fn read_multipart(req: &RawRequest) -> Result<Vec<MultipartPart>, IngestError> {
    let content_type = req
        .content_type
        .as_deref()
        .ok_or_else(|| IngestError::UnsupportedContentType("none".to_string()))?;
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .map_err(|e| IngestError::Malformed(format!("content type header: {}", e)))?,
    );

    let body = req.body.clone();
    let stream = futures_util::stream::once(async move { Ok::<Bytes, PayloadError>(body) });
    let mut multipart = Multipart::new(&headers, stream);

    let mut parts = Vec::new();
    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|e| IngestError::Malformed(format!("Multipart error: {}", e)))?;

        let disposition = field.content_disposition();
        let name = disposition
            .and_then(|cd| cd.get_name())
            .map(str::to_string);
        let filename = disposition
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| IngestError::Malformed(format!("Read error: {}", e)))?;
            data.extend_from_slice(&chunk);
        }

        parts.push(MultipartPart {
            name,
            data: Bytes::from(data),
            filename,
            content_type,
        });
    }

    Ok(parts)
}
