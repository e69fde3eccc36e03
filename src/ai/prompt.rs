//! Prompt construction for error detection and code fixing.
//!
//! [`PromptBuilder`] produces `(system, user)` chat-message pairs for any
//! OpenAI-compatible `/v1/chat/completions` endpoint.  Two shapes:
//! * **Detection** (`detection_chat`) — the model must answer only `YES` or
//!   `NO`.
//! * **Fix** (`fix_chat`) — the model must return only the corrected source,
//!   structure preserved, no commentary.
//!
//! The free-text detection reply is reduced to a boolean by
//! [`contains_affirmative`]: presence of the `YES` token, case-insensitive.
//! Anything else — including replies that name neither token — counts as
//! "no error found".

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

const DETECTION_SYSTEM: &str = "\
You are an expert {dialect} code checker.
Detect whether the code has any syntax or logical errors.
Return 'YES' if errors exist, 'NO' if the code is correct.
ONLY return 'YES' or 'NO' and nothing else.";

const FIX_SYSTEM: &str = "\
You are an expert {dialect} code fixer.
Correct syntax and logic errors while keeping the structure unchanged.
Do not add any extra text. Only return the corrected code.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds detection and fix prompts for a given source dialect.
///
/// # Example
/// ```rust
/// use sketch_sentry::ai::PromptBuilder;
///
/// let builder = PromptBuilder::new("Arduino");
/// let (system, user) = builder.detection_chat("void loop(){");
/// assert!(system.contains("Arduino"));
/// assert!(user.contains("void loop(){"));
/// ```
pub struct PromptBuilder {
    dialect: String,
}

impl PromptBuilder {
    /// Create a builder for the given dialect label (e.g. `"Arduino"`).
    pub fn new(dialect: &str) -> Self {
        Self {
            dialect: dialect.to_string(),
        }
    }

    /// Build the `(system, user)` pair for an error-detection call.
    pub fn detection_chat(&self, source: &str) -> (String, String) {
        let system = DETECTION_SYSTEM.replace("{dialect}", &self.dialect);
        let user = format!("Code to check:\n\n{source}");
        (system, user)
    }

    /// Build the `(system, user)` pair for a fix call.
    pub fn fix_chat(&self, source: &str) -> (String, String) {
        let system = FIX_SYSTEM.replace("{dialect}", &self.dialect);
        let user = format!("Fix the following code:\n\n{source}");
        (system, user)
    }
}

// ---------------------------------------------------------------------------
// Verdict parsing
// ---------------------------------------------------------------------------

/// Reduce a free-text detection reply to a boolean verdict.
///
/// `true` iff the reply contains the affirmative token `YES`, matched
/// case-insensitively.  Malformed replies ("MAYBE", empty, prose) are `false`.
pub fn contains_affirmative(answer: &str) -> bool {
    answer.to_uppercase().contains("YES")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
