// Shared prompt fragments. Each module that calls the LLM keeps its own
// prompts.rs next to it; only cross-cutting pieces live here.

/// System prompt that asks for a bare JSON object.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with a single valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";
