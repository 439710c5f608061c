//! Reply extraction pipeline
//!
//! The inference backend echoes the prompt ahead of the generated
//! continuation. This module isolates the reply with an ordered pipeline:
//! strip the echo, cut at a hallucinated user turn, cut at the first
//! paragraph break, trim. Each step feeds the next; a missing marker
//! leaves the text unchanged.

use crate::memory::{PromptStyle, ASSISTANT_TAG, USER_TAG};

/// Marker that opens a hallucinated user turn in plain-style output
const PLAIN_USER_MARKER: &str = "\nUser:";
/// Blank-line paragraph boundary
const PARAGRAPH_BREAK: &str = "\n\n";

/// Run the full pipeline over a raw model output.
pub fn extract_reply(raw: &str, prompt: &str, style: PromptStyle) -> String {
    let isolated = isolate_continuation(raw, prompt, style);
    let cut = cut_at_user_turn(isolated, style);
    let cut = cut_at_paragraph_break(cut);
    cut.trim().to_string()
}

/// Step 1: drop the echoed prompt.
///
/// Chat-style output is split after the last assistant tag; when the tag
/// is absent (and always in plain style) the sent prompt's length is
/// sliced off instead. The fallback assumes the backend echoes the prompt
/// byte for byte.
fn isolate_continuation<'a>(raw: &'a str, prompt: &str, style: PromptStyle) -> &'a str {
    if style == PromptStyle::Chat {
        if let Some(idx) = raw.rfind(ASSISTANT_TAG) {
            return &raw[idx + ASSISTANT_TAG.len()..];
        }
    }
    raw.get(prompt.len()..).unwrap_or("")
}

/// Step 2: cut at the first marker that would open a new user turn.
fn cut_at_user_turn(text: &str, style: PromptStyle) -> &str {
    let marker = match style {
        PromptStyle::Chat => USER_TAG,
        PromptStyle::Plain => PLAIN_USER_MARKER,
    };

    match text.find(marker) {
        Some(idx) => &text[..idx],
        None => text,
    }
}

/// Step 3: cut at the first blank-line paragraph boundary.
fn cut_at_paragraph_break(text: &str) -> &str {
    match text.find(PARAGRAPH_BREAK) {
        Some(idx) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolate_after_assistant_tag() {
        let raw = "<|user|>\nhi</s>\n<|assistant|>\nhello there";
        let isolated = isolate_continuation(raw, "ignored", PromptStyle::Chat);
        assert_eq!(isolated, "\nhello there");
    }

    #[test]
    fn test_isolate_uses_last_assistant_tag() {
        let raw = "<|assistant|>\nold</s>\n<|assistant|>\nnew";
        let isolated = isolate_continuation(raw, "ignored", PromptStyle::Chat);
        assert_eq!(isolated, "\nnew");
    }

    #[test]
    fn test_isolate_falls_back_to_prompt_length() {
        let prompt = "User: hi\nBot:";
        let raw = "User: hi\nBot: hello";
        let isolated = isolate_continuation(raw, prompt, PromptStyle::Chat);
        assert_eq!(isolated, " hello");
    }

    #[test]
    fn test_isolate_plain_slices_prompt_length() {
        let prompt = "User: hi\nBot:";
        let raw = "User: hi\nBot: hello";
        let isolated = isolate_continuation(raw, prompt, PromptStyle::Plain);
        assert_eq!(isolated, " hello");
    }

    #[test]
    fn test_isolate_output_shorter_than_prompt() {
        let isolated = isolate_continuation("short", "a much longer prompt", PromptStyle::Plain);
        assert_eq!(isolated, "");
    }

    #[test]
    fn test_cut_at_user_turn_chat() {
        let text = "hello there<|user|>\nfollow-up";
        assert_eq!(cut_at_user_turn(text, PromptStyle::Chat), "hello there");
    }

    #[test]
    fn test_cut_at_user_turn_plain() {
        let text = " hello there\nUser: follow-up";
        assert_eq!(cut_at_user_turn(text, PromptStyle::Plain), " hello there");
    }

    #[test]
    fn test_cut_at_user_turn_absent_marker() {
        let text = "no markers here";
        assert_eq!(cut_at_user_turn(text, PromptStyle::Chat), text);
        assert_eq!(cut_at_user_turn(text, PromptStyle::Plain), text);
    }

    #[test]
    fn test_cut_at_paragraph_break() {
        assert_eq!(cut_at_paragraph_break("first\n\nsecond"), "first");
        assert_eq!(cut_at_paragraph_break("no break"), "no break");
    }

    #[test]
    fn test_full_pipeline_plain() {
        let prompt = "User: hi\nBot:";
        let raw = "User: hi\nBot: hello there\nUser: fake turn\n\nrambling";
        assert_eq!(extract_reply(raw, prompt, PromptStyle::Plain), "hello there");
    }

    #[test]
    fn test_full_pipeline_chat() {
        // A decoded output keeps the textual role markers but drops the
        // special end-of-turn token.
        let prompt = "<|system|>\nsys</s>\n<|user|>\nhi</s>\n<|assistant|>\n";
        let raw = "<|system|>\nsys\n<|user|>\nhi\n<|assistant|>\nhello there\n<|user|>\nfake turn";
        assert_eq!(extract_reply(raw, prompt, PromptStyle::Chat), "hello there");
    }

    #[test]
    fn test_pipeline_keeps_first_paragraph_only() {
        let prompt = "User: hi\nBot:";
        let raw = "User: hi\nBot: paragraph one\n\nparagraph two";
        assert_eq!(
            extract_reply(raw, prompt, PromptStyle::Plain),
            "paragraph one"
        );
    }
}
