use super::types::ApiError;
use crate::llm::ImageData;
use axum::{
    extract::{Multipart, multipart::MultipartError},
    http::StatusCode,
};
use tracing::{debug, info};

pub const ALLOWED_IMAGE_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/heic",
    "image/heif",
];

/// Fields of an `/ask` submission. Blank values count as absent.
#[derive(Debug, Default)]
pub struct AskForm {
    pub session_id: Option<String>,
    pub question: Option<String>,
    pub action: Option<String>,
    pub image: Option<UploadedImage>,
}

#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl AskForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = AskForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error("Failed to read multipart field", e))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "image" | "image_question" => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error("Failed to read image bytes", e))?;

                    // Browsers send an empty part when no file was picked.
                    if data.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                        continue;
                    }

                    form.image = Some(UploadedImage {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    });
                }
                "session_id" | "question" | "text_question" | "action" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| multipart_error("Failed to read form field", e))?;
                    let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());

                    match name.as_str() {
                        "session_id" => form.session_id = value,
                        "action" => form.action = value,
                        _ => form.question = value.or(form.question.take()),
                    }
                }
                other => debug!("Ignoring unknown form field: {}", other),
            }
        }

        Ok(form)
    }
}

fn multipart_error(context: &str, err: MultipartError) -> ApiError {
    let detail = format!("{}: {}", context, err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(detail)
    } else {
        ApiError::BadRequest(detail)
    }
}

impl UploadedImage {
    /// Checks the declared content type against the allow-list.
    pub fn validate(self) -> Result<ImageData, ApiError> {
        let content_type = self
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Unsupported image type: {}. Please use JPEG, PNG, WEBP, GIF, HEIC or HEIF.",
                content_type
            )));
        }

        info!(
            "Received image: {}, type: {}, size: {} bytes",
            self.file_name.as_deref().unwrap_or("unnamed"),
            content_type,
            self.data.len()
        );

        Ok(ImageData::new(content_type, self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upload(content_type: Option<&str>) -> UploadedImage {
        UploadedImage {
            file_name: Some("question.png".to_string()),
            content_type: content_type.map(str::to_string),
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_allowed_types_pass() {
        for content_type in ALLOWED_IMAGE_TYPES {
            let image = upload(Some(content_type)).validate().unwrap();
            assert_eq!(image.mime_type, content_type);
            assert_eq!(image.data, vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_pdf_is_rejected() {
        let err = upload(Some("application/pdf")).validate().unwrap_err();
        assert_eq!(
            err.detail(),
            "Unsupported image type: application/pdf. Please use JPEG, PNG, WEBP, GIF, HEIC or HEIF."
        );
    }

    #[test]
    fn test_missing_content_type_is_rejected() {
        let err = upload(None).validate().unwrap_err();
        assert!(err.detail().contains("application/octet-stream"));
    }
}
