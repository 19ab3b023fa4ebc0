use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::errors::AppError;
use crate::models::ResumeAvailable;
use crate::resumes::intake::{resume_text, IntakeError, UploadedFile};
use crate::state::ResumeAnalyzerState;

const RESUME_FIELD: &str = "resume";

/// POST /upload-resume
/// Multipart form with the file in the `resume` field.
pub async fn handle_upload_resume(
    State(state): State<ResumeAnalyzerState>,
    multipart: Multipart,
) -> Result<Json<ResumeAvailable>, AppError> {
    let file = read_resume_field(multipart)
        .await?
        .ok_or_else(|| AppError::Validation("No resume file uploaded.".to_string()))?;

    // PDF parsing is CPU-bound.
    let text = tokio::task::spawn_blocking(move || resume_text(&file))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| match e {
            IntakeError::Empty => AppError::Validation(e.to_string()),
            IntakeError::Pdf(_) => AppError::UnprocessableEntity(e.to_string()),
        })?;

    let resume = state.analyzer.analyze(&text).await?;
    Ok(Json(resume))
}

async fn read_resume_field(mut multipart: Multipart) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}
