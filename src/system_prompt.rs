//! System prompt construction for call personas
//!
//! Combines the session's persona, labels, guardrails and closing strategy
//! into the instructions sent ahead of the transcript on every turn.

use crate::session::SessionConfig;
use std::fmt::Write;

/// Phone-specific instructions every persona receives
const VOICE_RULES: &str = r"You are speaking on a live phone call. Everything you write is read aloud by a text-to-speech voice.
- Reply in one to three short, natural sentences.
- Never use lists, markdown, emoji, or URLs.
- Ask at most one question per reply.
- If the caller asks to stop or to be removed from the list, apologise, confirm, and end politely.";

/// Build the system prompt for a session
pub fn build_system_prompt(config: &SessionConfig) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "You are {}.", config.persona);
    if let Some(company) = &config.company {
        let _ = writeln!(prompt, "You are calling on behalf of {company}.");
    }
    if let Some(customer) = &config.customer_name {
        let _ = writeln!(prompt, "The person you are calling is {customer}.");
    }
    if let Some(campaign) = &config.campaign {
        let _ = writeln!(prompt, "This call is part of the \"{campaign}\" campaign.");
    }
    let _ = writeln!(
        prompt,
        "You opened the call with: \"{}\" and then asked: \"{}\"",
        config.greeting, config.opening_question
    );

    prompt.push('\n');
    prompt.push_str(VOICE_RULES);
    let _ = write!(
        prompt,
        "\n- Respond in the language matching the tag {}.",
        config.language.as_str()
    );

    if !config.guardrails.is_empty() {
        let _ = write!(prompt, "\n\nGuardrails:\n{}", config.guardrails);
    }
    if !config.closing_strategy.is_empty() {
        let _ = write!(prompt, "\n\nClosing strategy:\n{}", config.closing_strategy);
    }

    prompt
}
