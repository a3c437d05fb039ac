//! System prompt assembly.
//!
//! The base instructions live in a template; per-user sections are appended
//! from the context's profile fields. Returning users additionally get the
//! running summary so the model can recall compacted-away history.

use crate::models::UserContext;

pub const BASE_PROMPT: &str = include_str!("templates/base_prompt.md");

/// Build the personalized system prompt for one turn.
pub fn build_system_prompt(context: &UserContext, first_contact: bool) -> String {
    let mut prompt = String::from(BASE_PROMPT);

    if let Some(interest) = context.chat_interest.as_deref().filter(|s| !s.is_empty()) {
        prompt.push_str(&format!(
            "\n## Current interaction focus\n\nThe user has indicated a specific \
             interest in: **{interest}**. Use this to frame your tone and depth, \
             but follow the user if they change the subject.\n"
        ));
    }

    if !context.topics.is_empty() {
        let topics = context.topics.join(", ");
        prompt.push_str(&format!(
            "\n## User interests\n\nThe user is generally interested in: {topics}. \
             Reference these only when it makes the conversation more natural.\n"
        ));
    }

    if let Some(birthdate) = context.birthdate.as_deref().filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("\n## User birthdate\n\n{birthdate}\n"));
    }

    if !first_contact && !context.user_summary.is_empty() {
        prompt.push_str(&format!(
            "\n## Previous conversation context\n\nSummary of history: {}\n\n\
             You already know this information; do not ask for details it \
             contains. If the user refers to something discussed before, look \
             here first.\n",
            context.user_summary
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_context_is_just_the_base() {
        let prompt = build_system_prompt(&UserContext::default(), false);
        assert_eq!(prompt, BASE_PROMPT);
    }

    #[test]
    fn test_interest_section_included() {
        let context = UserContext::seeded("astronomy");
        let prompt = build_system_prompt(&context, true);
        assert!(prompt.contains("**astronomy**"));
    }

    #[test]
    fn test_summary_only_for_returning_users() {
        let context = UserContext {
            user_summary: "Asked about Mars.".to_string(),
            ..UserContext::default()
        };

        let first = build_system_prompt(&context, true);
        assert!(!first.contains("Asked about Mars."));

        let returning = build_system_prompt(&context, false);
        assert!(returning.contains("Asked about Mars."));
    }

    #[test]
    fn test_profile_fields_rendered() {
        let context = UserContext {
            topics: vec!["cooking".to_string(), "jazz".to_string()],
            birthdate: Some("1990-04-01".to_string()),
            ..UserContext::default()
        };
        let prompt = build_system_prompt(&context, false);
        assert!(prompt.contains("cooking, jazz"));
        assert!(prompt.contains("1990-04-01"));
    }
}
