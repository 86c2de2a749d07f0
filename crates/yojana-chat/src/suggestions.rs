//! Predefined questions offered to the user as one-tap prompts.

/// Suggested questions, in display order. Each one hits a different rule.
pub const PREDEFINED_QUESTIONS: [&str; 6] = [
    "What pension schemes are available for senior citizens?",
    "How can I apply for education scholarships?",
    "Tell me about farmer assistance programs",
    "What health insurance schemes does the government offer?",
    "Housing schemes for low-income families",
    "Employment programs for rural areas",
];

/// Question at zero-based `index`.
pub fn question(index: usize) -> Option<&'static str> {
    PREDEFINED_QUESTIONS.get(index).copied()
}
