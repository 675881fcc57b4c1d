// Course matching: prompt construction, input/output validation, and the
// orchestrator that drives the LLM comparison and the transfer log.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod validation;
