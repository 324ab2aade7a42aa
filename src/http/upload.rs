//! Multipart uploads with progress reporting

use super::ClientError;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use reqwest::multipart::{Form, Part};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Receives upload progress as a whole percentage (0-100)
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Size of the chunks file bodies are streamed in
const CHUNK_SIZE: usize = 64 * 1024;

/// Percentage of `total` covered by `loaded`, rounded half up
pub fn percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let loaded = u128::from(loaded.min(total));
    let total = u128::from(total);
    let pct = (loaded * 200 + total) / (total * 2);
    u8::try_from(pct).unwrap_or(100)
}

/// Turns byte counts into percentages and reports each increase once
pub struct ProgressTracker {
    total: u64,
    loaded: u64,
    last: Option<u8>,
    callback: ProgressCallback,
}

impl ProgressTracker {
    pub fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            total,
            loaded: 0,
            last: None,
            callback,
        }
    }

    /// Record `bytes` more bytes sent
    pub fn advance(&mut self, bytes: u64) {
        self.report(self.loaded.saturating_add(bytes));
    }

    /// Record an absolute `(loaded, total)` observation; the count never
    /// moves backwards
    pub fn report(&mut self, loaded: u64) {
        self.loaded = loaded.min(self.total).max(self.loaded);
        if self.total == 0 {
            return;
        }

        let pct = percent(self.loaded, self.total);
        if self.last.map_or(true, |last| pct > last) {
            self.last = Some(pct);
            (self.callback)(pct);
        }
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }
}

/// One file in a multipart body
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl FilePart {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        Self {
            field: field.into(),
            mime: guess_mime(&file_name).to_string(),
            file_name,
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk into a part named `field`
    pub async fn from_path(field: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(field, file_name, bytes))
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Content type from a file extension
pub fn guess_mime(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("txt") => "text/plain",
        Some("md") | Some("markdown") => "text/markdown",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("html") | Some("htm") => "text/html",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Text fields and files sent as `multipart/form-data`
#[derive(Default)]
pub struct MultipartBody {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
    progress: Option<ProgressCallback>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add a text field only when `value` is present
    pub fn text_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    pub fn progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Bytes of file content, which is what progress is measured against
    pub fn total_file_bytes(&self) -> u64 {
        self.files.iter().map(FilePart::len).sum()
    }

    pub(crate) fn into_form(self) -> Result<Form, ClientError> {
        let tracker = self.progress.map(|callback| {
            Arc::new(Mutex::new(ProgressTracker::new(
                self.files.iter().map(FilePart::len).sum(),
                callback,
            )))
        });

        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        for file in self.files {
            let len = file.len();
            let body = match &tracker {
                Some(tracker) => reqwest::Body::wrap_stream(progress_stream(file.bytes, Arc::clone(tracker))),
                None => reqwest::Body::from(file.bytes),
            };
            let part = Part::stream_with_length(body, len)
                .file_name(file.file_name)
                .mime_str(&file.mime)
                .map_err(|e| ClientError::InvalidHeader {
                    name: "content-type".to_string(),
                    reason: e.to_string(),
                })?;
            form = form.part(file.field, part);
        }

        Ok(form)
    }
}

impl fmt::Debug for MultipartBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartBody")
            .field("fields", &self.fields)
            .field(
                "files",
                &self.files.iter().map(|p| &p.file_name).collect::<Vec<_>>(),
            )
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Stream `bytes` in chunks, advancing the tracker as each chunk is pulled
fn progress_stream(
    bytes: Bytes,
    tracker: Arc<Mutex<ProgressTracker>>,
) -> impl futures_util::Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + CHUNK_SIZE).min(bytes.len())))
        .collect();

    stream::iter(chunks).map(move |chunk| {
        tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .advance(chunk.len() as u64);
        Ok(chunk)
    })
}
