// LLM prompt template for the rewrite module.
// The three headings here are the same titles `sections::Section` parses back out.

/// Resume rewrite prompt template.
/// Replace: {target_role}, then {resume_text} (last, so the resume is embedded verbatim).
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"You are a professional resume strategist.

Rewrite the following resume to target a job as a {target_role}. Rephrase the resume to align with the role's responsibilities, modern terminology, and impactful bullet points.

Return the rewritten resume structured using the following headers:

## Professional Summary
## Key Experience
## Core Skills

Only include those three sections in your output.

Original Resume:
{resume_text}
"#;
