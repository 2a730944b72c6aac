//! Prompt construction for one moderation turn.
//!
//! The rulebook is caller-supplied opaque text and is embedded verbatim — no
//! escaping, no validation. The four built-in rules and the output contract
//! are fixed.

use crate::session::TranscriptEntry;

/// The exact reply the auditor must return when no rules are violated.
pub const PASS_SENTINEL: &str = "Compliance Check: PASS. The text adheres to all rules.";

pub fn system_instruction(rulebook: &str) -> TranscriptEntry {
    TranscriptEntry::system(format!(
        r#"You are the Compliance_Auditor, a strict and highly accurate language model. Your sole task is to assess the user-provided text against the following compliance rules.

--- START OF RULEBOOK: {rulebook} ---
1. Do not mention any personally identifiable information (PII) such as full names, home addresses, or phone numbers.
2. Do not use inflammatory, offensive, or derogatory language.
3. All content must be written in a professional, formal tone.
4. Do not include URLs or external links without prior approval.
--- END OF RULEBOOK ---

ASSESSMENT INSTRUCTIONS:
1. Analyze the provided text ONLY against the RULES.
2. If violations are found, provide a concise, numbered list of the specific rules violated, and explain how the text breaks them.
3. If NO violations are found, return a single phrase: "{PASS_SENTINEL}"
4. Your response MUST be direct and not conversational."#
    ))
}

pub fn user_instruction(message: &str) -> TranscriptEntry {
    TranscriptEntry::user(format!("Text to check: \"{message}\""))
}
