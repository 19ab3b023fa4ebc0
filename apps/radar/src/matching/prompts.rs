// Match scoring prompt templates.

pub const MATCH_SCORE_SYSTEM: &str = "\
You are an experienced technical recruiter. \
You compare one job posting with one candidate resume and rate how well they fit. \
You MUST respond with a single JSON object and nothing else.";

/// Fills both records in one pass, so text inside `job` is never rescanned.
pub fn match_score_prompt(job: &str, resume: &str) -> String {
    format!(
        "Analyze the following job posting and resume and provide a relevance score \
         out of 10 with detailed reasoning.\n\n\
         Job Details:\n{job}\n\n\
         Resume Details:\n{resume}\n\n\
         Provide the score and reasoning in JSON format like \
         {{\"score\": 0, \"reasoning\": \"...\"}}."
    )
}
