//! Upload forms and `multipart/form-data` encoding.
//!
//! A form is either a single `file` field or a numbered `file0..fileN` set.
//! Each field says explicitly whether it is required; validation happens
//! before any file is read or any request is sent.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::ActionError;

/// Message for a single-file form with nothing selected.
pub const SELECT_A_FILE: &str = "Please select a file";

/// Message for a multi-file form with nothing selected.
pub const SELECT_AT_LEAST_ONE: &str = "Please select at least one file to upload";

/// One file input of an upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadField {
    /// Multipart field name, `file` or `file{index}`.
    pub name: String,
    /// Human label, used in validation messages.
    pub label: String,
    pub path: Option<PathBuf>,
    pub required: bool,
}

/// An upload form before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    fields: Vec<UploadField>,
    multi: bool,
}

impl UploadForm {
    /// A single required `file` field.
    pub fn single(path: Option<PathBuf>) -> Self {
        Self {
            fields: vec![UploadField {
                name: "file".to_string(),
                label: "File".to_string(),
                path,
                required: true,
            }],
            multi: false,
        }
    }

    /// Numbered fields `file0..fileN`, one per `(label, path, required)`.
    pub fn multi<I>(inputs: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<PathBuf>, bool)>,
    {
        let fields = inputs
            .into_iter()
            .enumerate()
            .map(|(i, (label, path, required))| UploadField {
                name: format!("file{i}"),
                label,
                path,
                required,
            })
            .collect();
        Self {
            fields,
            multi: true,
        }
    }

    /// The standard two-file form: plans export and apps export. Either one
    /// may be sent alone; the backend picks the analysis mode from what
    /// arrives.
    pub fn plans_and_apps(plans: Option<PathBuf>, apps: Option<PathBuf>) -> Self {
        Self::multi([
            ("App Service Plans CSV".to_string(), plans, false),
            ("App Services CSV".to_string(), apps, false),
        ])
    }

    pub fn fields(&self) -> &[UploadField] {
        &self.fields
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// Validate the form without touching the filesystem.
    ///
    /// Returns the fields that will be sent. Optional fields left empty are
    /// skipped. An empty form and an empty required field are rejected.
    pub fn validate(&self) -> Result<Vec<&UploadField>, ActionError> {
        let selected: Vec<&UploadField> =
            self.fields.iter().filter(|f| f.path.is_some()).collect();

        if selected.is_empty() {
            let message = if self.multi {
                SELECT_AT_LEAST_ONE
            } else {
                SELECT_A_FILE
            };
            return Err(ActionError::Invalid(message.to_string()));
        }

        if let Some(missing) = self
            .fields
            .iter()
            .find(|f| f.required && f.path.is_none())
        {
            return Err(ActionError::Invalid(format!(
                "Please select a file for {}",
                missing.label
            )));
        }

        Ok(selected)
    }

    /// Validate, then read every selected file.
    pub fn prepare(&self) -> Result<PreparedUpload, ActionError> {
        let selected = self.validate()?;
        let mut parts = Vec::with_capacity(selected.len());
        for field in selected {
            let Some(path) = field.path.as_deref() else {
                continue;
            };
            let bytes = fs::read(path).map_err(|e| {
                ActionError::Invalid(format!("Cannot read {}: {e}", path.display()))
            })?;
            parts.push(UploadPart {
                field: field.name.clone(),
                filename: file_name(path),
                bytes,
            });
        }
        Ok(PreparedUpload { parts })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string())
}

/// One file ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    pub field: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A validated upload with file contents loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedUpload {
    pub parts: Vec<UploadPart>,
}

impl PreparedUpload {
    pub fn from_parts(parts: Vec<UploadPart>) -> Self {
        Self { parts }
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.filename.as_str()).collect()
    }

    /// Encode as `multipart/form-data`, returning the content type and body.
    pub fn encode(&self) -> (String, Vec<u8>) {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let boundary = format!("----plansight{nanos:x}");
        (
            format!("multipart/form-data; boundary={boundary}"),
            self.encode_with_boundary(&boundary),
        )
    }

    fn encode_with_boundary(&self, boundary: &str) -> Vec<u8> {
        let mut body = Vec::new();
        for part in &self.parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.field,
                    part.filename.replace(['"', '\r', '\n'], "_")
                )
                .as_bytes(),
            );
            body.extend_from_slice(
                format!("Content-Type: {}\r\n\r\n", part_content_type(&part.filename)).as_bytes(),
            );
            body.extend_from_slice(&part.bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }
}

fn part_content_type(filename: &str) -> &'static str {
    if filename.to_ascii_lowercase().ends_with(".csv") {
        "text/csv"
    } else {
        "application/octet-stream"
    }
}
