// All LLM prompt constants for the insights module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for Q&A over the user's own data. Answers in prose, no JSON.
pub const ASK_SYSTEM: &str = "You are a pragmatic career coach. \
    Answer using ONLY the candidate data provided in the prompt. \
    If the data does not contain the answer, say so plainly. \
    Be concise and concrete.";

/// Q&A prompt template. Replace `{context}` and `{question}` before sending.
pub const ASK_PROMPT_TEMPLATE: &str = r#"Candidate data (JSON):
{context}

Question: {question}

Answer the question using only the data above."#;

/// System prompt for next-step recommendation — enforces JSON-only output.
pub const RECOMMEND_SYSTEM: &str = "You are an interview strategist. \
    Given a recruitment process and its steps so far, recommend what the \
    candidate should do next.";

/// Recommendation prompt template. Replace `{process}` before sending.
pub const RECOMMEND_PROMPT_TEMPLATE: &str = r#"Recruitment process so far (JSON):
{process}

Recommend the candidate's next move.

Return a JSON object with this EXACT schema (no extra fields):
{
  "recommendation": "one-paragraph concrete advice",
  "suggested_category": "phone_screen | technical | behavioral | onsite | offer | other | retrospective"
}"#;
