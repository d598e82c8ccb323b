use base64::prelude::BASE64_STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::ValidationError;
use crate::models::user::UserId;
use crate::server::constants::MAX_UPLOAD_BYTES;

pub type ResourceId = sqlx::types::Uuid;

const RESOURCE_NAME_LENGTH_LIMIT: usize = 255;
const RESOURCE_COURSE_LENGTH_LIMIT: usize = 50;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "resource_type")]
pub enum ResourceType {
    #[strum(serialize = "Lecture Notes")]
    #[serde(rename = "Lecture Notes")]
    #[sqlx(rename = "Lecture Notes")]
    LectureNotes,
    #[strum(serialize = "Textbook")]
    #[serde(rename = "Textbook")]
    #[sqlx(rename = "Textbook")]
    Textbook,
    #[strum(serialize = "Research Paper")]
    #[serde(rename = "Research Paper")]
    #[sqlx(rename = "Research Paper")]
    ResearchPaper,
    #[strum(serialize = "Lab Equipment")]
    #[serde(rename = "Lab Equipment")]
    #[sqlx(rename = "Lab Equipment")]
    LabEquipment,
    #[strum(serialize = "Software License")]
    #[serde(rename = "Software License")]
    #[sqlx(rename = "Software License")]
    SoftwareLicense,
    #[strum(serialize = "Video Lecture")]
    #[serde(rename = "Video Lecture")]
    #[sqlx(rename = "Video Lecture")]
    VideoLecture,
    #[default]
    #[strum(serialize = "Other")]
    #[serde(rename = "Other")]
    #[sqlx(rename = "Other")]
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// File attached to a resource. Url and name always travel together, the
/// remaining metadata is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileAttachment {
    pub file_url: String,
    pub file_name: String,
    pub file_mime_type: Option<String>,
    pub file_size_bytes: Option<i64>,
}

impl FileAttachment {
    pub fn from_parts(
        file_url: Option<String>,
        file_name: Option<String>,
        file_mime_type: Option<String>,
        file_size_bytes: Option<i64>,
    ) -> Option<Self> {
        match (file_url, file_name) {
            (Some(file_url), Some(file_name)) => Some(Self {
                file_url,
                file_name,
                file_mime_type,
                file_size_bytes,
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub course: String,
    pub year: i32,
    pub description: String,
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub file: Option<FileAttachment>,
    pub uploader_id: Option<UserId>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ResourceRow {
    pub id: ResourceId,
    pub name: String,
    #[sqlx(rename = "type")]
    pub resource_type: ResourceType,
    pub course: String,
    pub year: i32,
    pub description: String,
    pub keywords: Vec<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_mime_type: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub uploader_id: Option<UserId>,
}

impl From<ResourceRow> for Resource {
    fn from(row: ResourceRow) -> Self {
        if row.file_url.is_some() != row.file_name.is_some() {
            tracing::warn!(
                "resource {} has an incomplete file attachment, ignoring it",
                row.id
            );
        }
        Self {
            id: row.id,
            name: row.name,
            resource_type: row.resource_type,
            course: row.course,
            year: row.year,
            description: row.description,
            keywords: row.keywords,
            file: FileAttachment::from_parts(
                row.file_url,
                row.file_name,
                row.file_mime_type,
                row.file_size_bytes,
            ),
            uploader_id: row.uploader_id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Validated admin upload request.
#[derive(Clone, Debug)]
pub struct UploadResource {
    pub name: String,
    pub resource_type: ResourceType,
    pub course: String,
    pub year: i32,
    pub description: String,
    pub keywords: Vec<String>,
    pub file: Option<UploadFile>,
}

#[derive(Debug, Deserialize)]
pub struct UploadFilePayload {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub content_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadResourcePayload {
    pub name: String,
    #[serde(rename = "type", default)]
    pub resource_type: ResourceType,
    pub course: String,
    pub year: i32,
    pub description: String,
    /// Comma separated, as typed into the upload form.
    #[serde(default)]
    pub keywords: String,
    pub file: Option<UploadFilePayload>,
}

impl TryFrom<UploadResourcePayload> for UploadResource {
    type Error = ValidationError;

    fn try_from(payload: UploadResourcePayload) -> Result<Self, Self::Error> {
        let name = validate_required_field("name", &payload.name, RESOURCE_NAME_LENGTH_LIMIT)?;
        let course =
            validate_required_field("course", &payload.course, RESOURCE_COURSE_LENGTH_LIMIT)?;
        let description = validate_required_field("description", &payload.description, usize::MAX)?;
        validate_year(payload.year)?;
        let file = payload.file.map(decode_upload_file).transpose()?;
        Ok(Self {
            name,
            resource_type: payload.resource_type,
            course,
            year: payload.year,
            description,
            keywords: parse_keywords(&payload.keywords),
            file,
        })
    }
}

fn decode_upload_file(payload: UploadFilePayload) -> Result<UploadFile, ValidationError> {
    let file_name = validate_file_name(&payload.file_name)?;
    let bytes = BASE64
        .decode(payload.content_base64.as_bytes())
        .map_err(|e| ValidationError::InvalidInput {
            value: "<file content>".to_string(),
            reason: format!("file content is not valid base64: {e}"),
        })?;
    validate_file_size(bytes.len())?;
    Ok(UploadFile {
        file_name,
        mime_type: payload.mime_type.filter(|m| !m.trim().is_empty()),
        bytes,
    })
}

/// Splits the comma separated keyword field, dropping blank entries.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn validate_required_field(
    field: &str,
    value: &str,
    limit: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidInput {
            value: value.to_string(),
            reason: format!("{field} is required"),
        });
    }
    if trimmed.chars().count() > limit {
        return Err(ValidationError::InvalidInput {
            value: value.to_string(),
            reason: format!("{field} cannot be longer than {limit} chars"),
        });
    }
    Ok(trimmed.to_string())
}

pub fn validate_year(year: i32) -> Result<(), ValidationError> {
    if year < 1 {
        return Err(ValidationError::InvalidInput {
            value: year.to_string(),
            reason: "year should be >= 1".to_string(),
        });
    }
    Ok(())
}

pub fn validate_file_name(file_name: &str) -> Result<String, ValidationError> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidInput {
            value: file_name.to_string(),
            reason: "file name cannot be empty".to_string(),
        });
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed == "." || trimmed == ".." {
        return Err(ValidationError::InvalidInput {
            value: file_name.to_string(),
            reason: "file name cannot contain path separators".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

pub fn validate_file_size(size: usize) -> Result<(), ValidationError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::LimitExceeded {
            subject: "file size".to_string(),
            unit: "byte".to_string(),
            attempted: size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}
