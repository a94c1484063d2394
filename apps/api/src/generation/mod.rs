// Cover letter generation: form validation, tone, prompts, and the
// gate → throttle → LLM → history pipeline.
// All LLM calls go through llm_client — no direct HTTP calls here.

pub mod form;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod tone;
