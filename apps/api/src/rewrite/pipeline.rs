//! Resume rewrite: orchestrates one rewrite action.
//!
//! Flow: build prompt → single completion call → parse sections (+ contract report).
//!
//! The credential is resolved by the caller and passed in; nothing here reads
//! configuration or process state.

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extract::PlainResumeText;
use crate::llm_client::{ApiKey, CompletionError, CompletionService};
use crate::rewrite::prompts::REWRITE_PROMPT_TEMPLATE;
use crate::rewrite::sections::{check_contract, parse_sections, SectionMap};

/// Default role offered in the upload form.
pub const DEFAULT_TARGET_ROLE: &str = "AI Chatbot QA Tester";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Validated input to the prompt builder.
#[derive(Debug, Clone)]
pub struct RewriteRequest {
    resume_text: PlainResumeText,
    target_role: String,
}

impl RewriteRequest {
    /// Both the resume text and the target role must be non-blank.
    pub fn new(resume_text: PlainResumeText, target_role: &str) -> Result<Self, AppError> {
        if resume_text.is_empty() {
            return Err(AppError::Validation(
                "resume text cannot be empty".to_string(),
            ));
        }
        let target_role = target_role.trim();
        if target_role.is_empty() {
            return Err(AppError::Validation(
                "target_role cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            resume_text,
            target_role: target_role.to_string(),
        })
    }

    pub fn resume_text(&self) -> &PlainResumeText {
        &self.resume_text
    }

    pub fn target_role(&self) -> &str {
        &self.target_role
    }
}

/// Result of a successful rewrite.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteOutcome {
    /// Unparsed model output; this is what the download serves.
    pub rewritten: String,
    pub sections: SectionMap,
    /// Non-blocking notes about headings the model got wrong.
    pub warnings: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Builds the instruction string: preamble naming the role, the fixed
/// three-heading contract, then the resume text verbatim.
pub fn build_rewrite_prompt(request: &RewriteRequest) -> String {
    REWRITE_PROMPT_TEMPLATE
        .replace("{target_role}", request.target_role())
        .replace("{resume_text}", request.resume_text().as_str())
}

/// Runs prompt → completion → section parse. One completion attempt; failures
/// come back as the discriminated `CompletionError` for the caller to report.
pub async fn rewrite_resume(
    llm: &dyn CompletionService,
    credential: &ApiKey,
    request: &RewriteRequest,
) -> Result<RewriteOutcome, CompletionError> {
    let prompt = build_rewrite_prompt(request);
    info!(
        "Requesting rewrite for role '{}' (model: {}, prompt_chars={})",
        request.target_role(),
        llm.model(),
        prompt.chars().count()
    );

    let rewritten = llm.complete(credential, &prompt).await.map_err(|e| {
        warn!("Rewrite failed ({}): {e}", e.kind());
        e
    })?;

    let sections = parse_sections(&rewritten);
    let report = check_contract(&rewritten);

    info!(
        "Rewrite complete: {} chars, {} contract warning(s)",
        rewritten.chars().count(),
        report.warnings().len()
    );

    Ok(RewriteOutcome {
        rewritten,
        sections,
        warnings: report.warnings(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::rewrite::sections::Section;

    /// Scripted completion service that records what it was asked.
    pub(crate) struct StubCompletion {
        reply: Mutex<Option<Result<String, CompletionError>>>,
        pub calls: AtomicUsize,
        pub last_prompt: Mutex<Option<String>>,
    }

    impl StubCompletion {
        pub(crate) fn replying(text: &str) -> Self {
            Self::with(Ok(text.to_string()))
        }

        pub(crate) fn failing(error: CompletionError) -> Self {
            Self::with(Err(error))
        }

        fn with(reply: Result<String, CompletionError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl CompletionService for StubCompletion {
        async fn complete(&self, _credential: &ApiKey, prompt: &str) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(CompletionError::EmptyContent))
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    fn request() -> RewriteRequest {
        RewriteRequest::new(
            PlainResumeText::new("Jane Doe\nTested chatbots at Acme {target_role}"),
            "AI Chatbot QA Tester",
        )
        .unwrap()
    }

    #[test]
    fn test_prompt_names_role_and_headings() {
        let prompt = build_rewrite_prompt(&request());
        assert!(prompt.contains("target a job as a AI Chatbot QA Tester"));
        for heading in ["## Professional Summary", "## Key Experience", "## Core Skills"] {
            assert!(prompt.contains(heading), "missing {heading}");
        }
        assert!(prompt.contains("Only include those three sections"));
    }

    #[test]
    fn test_prompt_ends_with_verbatim_resume() {
        let prompt = build_rewrite_prompt(&request());
        assert!(prompt.ends_with("Original Resume:\nJane Doe\nTested chatbots at Acme {target_role}\n"));
    }

    #[test]
    fn test_request_rejects_blank_inputs() {
        assert!(RewriteRequest::new(PlainResumeText::new("  \n"), "QA").is_err());
        assert!(RewriteRequest::new(PlainResumeText::new("Jane"), "   ").is_err());
        let ok = RewriteRequest::new(PlainResumeText::new("Jane"), "  QA Lead ").unwrap();
        assert_eq!(ok.target_role(), "QA Lead");
    }

    #[tokio::test]
    async fn test_rewrite_parses_sections_and_keeps_raw_text() {
        let raw = "## Professional Summary\nA.\n## Key Experience\nB.\n## Core Skills\nD.";
        let llm = StubCompletion::replying(raw);
        let key = ApiKey::new("sk-test").unwrap();

        let outcome = rewrite_resume(&llm, &key, &request()).await.unwrap();

        assert_eq!(outcome.rewritten, raw);
        assert_eq!(outcome.sections.get(Section::CoreSkills), "D.\n");
        assert!(outcome.warnings.is_empty());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        let prompt = llm.last_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(prompt, build_rewrite_prompt(&request()));
    }

    #[tokio::test]
    async fn test_rewrite_surfaces_contract_warnings() {
        let llm = StubCompletion::replying("Here you go:\n## Core Skills\nRust");
        let key = ApiKey::new("sk-test").unwrap();

        let outcome = rewrite_resume(&llm, &key, &request()).await.unwrap();

        assert_eq!(outcome.sections.get(Section::CoreSkills), "Rust\n");
        assert_eq!(outcome.warnings.len(), 3);
    }

    #[tokio::test]
    async fn test_rewrite_failure_is_single_attempt() {
        let llm = StubCompletion::failing(CompletionError::RateLimited {
            message: "slow down".to_string(),
        });
        let key = ApiKey::new("sk-test").unwrap();

        let err = rewrite_resume(&llm, &key, &request()).await.unwrap_err();

        assert_eq!(err.kind(), "rate_limited");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }
}
