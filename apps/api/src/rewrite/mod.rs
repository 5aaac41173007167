// Resume rewrite engine.
// Implements: prompt building, the single completion call, section parsing, HTTP handlers.
// All completion calls go through llm_client; no direct HTTP calls here.

pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod sections;
