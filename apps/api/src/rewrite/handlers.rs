//! Axum route handlers for the Rewrite API.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{extract_text, ResumeDocument};
use crate::presentation::{SectionView, MISSING_CREDENTIAL_WARNING};
use crate::rewrite::pipeline::{rewrite_resume, RewriteRequest};
use crate::session::Session;
use crate::state::AppState;

/// File name offered for the rewritten resume download.
pub const DOWNLOAD_FILE_NAME: &str = "rewritten_resume.txt";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Fields of the multipart upload form. Only `resume` is mandatory.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file_name: Option<String>,
    pub file: Option<Bytes>,
    pub target_role: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub session_id: Uuid,
    pub file_name: String,
    pub resume_text: String,
}

#[derive(Debug, Deserialize)]
pub struct RewriteApiRequest {
    pub session_id: Uuid,
    pub target_role: String,
    /// Used only when no key is configured on the server.
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewriteApiResponse {
    Completed {
        session_id: Uuid,
        target_role: String,
        original: String,
        rewritten: String,
        sections: Vec<SectionView>,
        warnings: Vec<String>,
    },
    CredentialRequired {
        warning: String,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Shared steps (also used by the HTML flow)
// ────────────────────────────────────────────────────────────────────────────

/// Drains a multipart body into an [`UploadForm`]. Unknown fields are skipped.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                form.file_name = field.file_name().map(str::to_string);
                form.file = Some(field.bytes().await?);
            }
            "target_role" => form.target_role = Some(field.text().await?),
            "api_key" => form.api_key = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Extracts the uploaded resume and opens a session for it.
pub async fn extract_into_session(
    state: &AppState,
    file_name: Option<String>,
    file: Option<Bytes>,
) -> Result<Session, AppError> {
    let file = file.ok_or_else(|| AppError::Validation("resume file is required".to_string()))?;
    let file_name = file_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::Validation("uploaded file has no name".to_string()))?;

    let document = ResumeDocument::from_upload(&file_name, file)?;
    let resume_text = extract_text(document).await?;
    let session = state.sessions.create(&file_name, resume_text).await;

    info!("Opened session {} for '{}'", session.id, file_name);
    Ok(session)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/extract
///
/// Accepts a multipart `resume` (.pdf or .docx) and returns its plain text.
pub async fn handle_extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    let form = read_upload(multipart).await?;
    let session = extract_into_session(&state, form.file_name, form.file).await?;

    Ok(Json(ExtractResponse {
        session_id: session.id,
        file_name: session.file_name,
        resume_text: session.resume_text.to_string(),
    }))
}

/// POST /api/v1/resumes/rewrite
///
/// Rewrites a session's resume for the target role. Without a credential the
/// action is blocked with a warning rather than failing.
pub async fn handle_rewrite(
    State(state): State<AppState>,
    Json(request): Json<RewriteApiRequest>,
) -> Result<Json<RewriteApiResponse>, AppError> {
    let session = state
        .sessions
        .get(request.session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", request.session_id)))?;

    let rewrite_request = RewriteRequest::new(session.resume_text.clone(), &request.target_role)?;

    let Some(credential) = state.resolve_credential(request.api_key.as_deref()) else {
        return Ok(Json(RewriteApiResponse::CredentialRequired {
            warning: MISSING_CREDENTIAL_WARNING.to_string(),
        }));
    };

    let outcome = rewrite_resume(state.llm.as_ref(), &credential, &rewrite_request).await?;
    state.sessions.record_rewrite(session.id, &outcome.rewritten).await;

    Ok(Json(RewriteApiResponse::Completed {
        session_id: session.id,
        target_role: rewrite_request.target_role().to_string(),
        original: session.resume_text.to_string(),
        sections: SectionView::from_map(&outcome.sections),
        rewritten: outcome.rewritten,
        warnings: outcome.warnings,
    }))
}

/// GET /api/v1/resumes/:session_id/download
///
/// Serves the full, unparsed rewrite as a UTF-8 text attachment.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;

    let rewritten = session
        .last_rewrite
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} has no rewrite yet")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        rewritten,
    ))
}
