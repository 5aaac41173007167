//! Axum route handlers for the browser pages.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::warn;

use crate::errors::AppError;
use crate::presentation::render::{render_comparison, render_index, ComparisonPage, RewriteView};
use crate::presentation::{Notice, SectionView, MISSING_CREDENTIAL_WARNING};
use crate::rewrite::handlers::{extract_into_session, read_upload};
use crate::rewrite::pipeline::{rewrite_resume, RewriteRequest};
use crate::state::AppState;

/// GET /
pub async fn handle_index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    Ok(Html(render_index(!state.config.has_stored_api_key())?))
}

/// POST /rewrite
///
/// One-shot browser flow: upload → extract → rewrite → compare. Upload,
/// extraction, credential and completion failures are rendered on the page.
pub async fn handle_rewrite_page(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let ask_for_api_key = !state.config.has_stored_api_key();

    let form = match read_upload(multipart).await {
        Ok(form) => form,
        Err(e) => return error_page(&e, ask_for_api_key),
    };

    let session = match extract_into_session(&state, form.file_name, form.file).await {
        Ok(session) => session,
        Err(e) => return error_page(&e, ask_for_api_key),
    };

    let target_role = form.target_role.unwrap_or_default();
    let original = session.resume_text.to_string();
    let mut page = ComparisonPage {
        file_name: Some(&session.file_name),
        target_role: Some(target_role.trim()),
        original: Some(&original),
        notices: vec![Notice::success("Resume extracted successfully.")],
        rewrite: None,
    };

    let request = match RewriteRequest::new(session.resume_text.clone(), &target_role) {
        Ok(request) => request,
        Err(e) => {
            page.notices.push(Notice::error(e.user_message()));
            return page_response(e.status(), &page, ask_for_api_key);
        }
    };

    let Some(credential) = state.resolve_credential(form.api_key.as_deref()) else {
        page.notices.push(Notice::warning(MISSING_CREDENTIAL_WARNING));
        return page_response(StatusCode::OK, &page, ask_for_api_key);
    };

    match rewrite_resume(state.llm.as_ref(), &credential, &request).await {
        Ok(outcome) => {
            state
                .sessions
                .record_rewrite(session.id, &outcome.rewritten)
                .await;
            page.notices
                .extend(outcome.warnings.iter().map(Notice::warning));
            page.rewrite = Some(RewriteView {
                session_id: session.id,
                sections: SectionView::from_map(&outcome.sections),
            });
            page_response(StatusCode::OK, &page, ask_for_api_key)
        }
        Err(e) => {
            let e = AppError::from(e);
            page.notices.push(Notice::error(e.user_message()));
            page_response(e.status(), &page, ask_for_api_key)
        }
    }
}

fn error_page(error: &AppError, ask_for_api_key: bool) -> Response {
    warn!("Rewrite page failed: {error}");
    let page = ComparisonPage {
        notices: vec![Notice::error(error.user_message())],
        ..ComparisonPage::default()
    };
    page_response(error.status(), &page, ask_for_api_key)
}

/// A template failure falls back to the JSON error body.
fn page_response(status: StatusCode, page: &ComparisonPage<'_>, ask_for_api_key: bool) -> Response {
    match render_comparison(page, ask_for_api_key) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}
