//! Server-side HTML for the reviewer pages.
//!
//! Pages are minijinja templates registered under `.html` names, so every
//! interpolated value is HTML-escaped by the environment.

use minijinja::Environment;
use serde::Serialize;
use uuid::Uuid;

use super::{Notice, SectionView};
use crate::rewrite::pipeline::DEFAULT_TARGET_ROLE;

const TEMPLATES: [(&str, &str); 4] = [
    ("layout.html", include_str!("../../templates/layout.html")),
    ("upload_form.html", include_str!("../../templates/upload_form.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("comparison.html", include_str!("../../templates/comparison.html")),
];

/// Everything the comparison page may show. Absent parts are simply not rendered.
#[derive(Debug, Default, Serialize)]
pub struct ComparisonPage<'a> {
    pub file_name: Option<&'a str>,
    pub target_role: Option<&'a str>,
    pub original: Option<&'a str>,
    pub notices: Vec<Notice>,
    pub rewrite: Option<RewriteView>,
}

#[derive(Debug, Serialize)]
pub struct RewriteView {
    pub session_id: Uuid,
    pub sections: Vec<SectionView>,
}

#[derive(Serialize)]
struct PageContext<'a> {
    #[serde(flatten)]
    page: &'a ComparisonPage<'a>,
    ask_for_api_key: bool,
    form_role: &'a str,
}

fn build_env() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

/// Upload form. The API-key field only appears when no key is configured.
pub fn render_index(ask_for_api_key: bool) -> Result<String, minijinja::Error> {
    let env = build_env()?;
    env.get_template("index.html")?.render(PageContext {
        page: &ComparisonPage::default(),
        ask_for_api_key,
        form_role: DEFAULT_TARGET_ROLE,
    })
}

/// Side-by-side comparison, or whatever part of it the flow reached.
pub fn render_comparison(
    page: &ComparisonPage<'_>,
    ask_for_api_key: bool,
) -> Result<String, minijinja::Error> {
    let env = build_env()?;
    env.get_template("comparison.html")?.render(PageContext {
        page,
        ask_for_api_key,
        form_role: page.target_role.unwrap_or(DEFAULT_TARGET_ROLE),
    })
}
