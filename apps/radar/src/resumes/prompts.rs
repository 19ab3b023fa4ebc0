// Resume extraction prompt. Sent once per chunk; the system prompt is the
// shared JSON-only one.

pub const RESUME_EXTRACT_PROMPT: &str = r#"You are an expert in extracting information from resumes.
Extract and structure the following sections from the resume text below.
Use empty strings and empty arrays for anything the text does not contain. Do not invent data.

OUTPUT SCHEMA (return exactly this structure):
{
  "personal_information": {
    "name": "string",
    "email": "string",
    "phone": "string",
    "github": "string",
    "linkedin": "string"
  },
  "skills": ["string"],
  "education": ["string"],
  "work_experience": ["string"],
  "projects": ["string"],
  "certifications": ["string"],
  "unstructured_text_blocks": ["anything that does not fit the sections above"]
}

RESUME TEXT:
{chunk}"#;
