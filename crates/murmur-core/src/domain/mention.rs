use super::user::{is_handle_char, MAX_HANDLE_LEN};

/// Collects the distinct `@handle` mentions in `text`, in order of first appearance.
///
/// A mention starts at an `@` that is not glued to a preceding handle character
/// (so `mail@example.org` is not a mention) and takes at most the first 18 handle
/// characters that follow it. Handles are case-sensitive, so `@Bob` and `@bob` are
/// two mentions.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices();

    while let Some((start, c)) = chars.next() {
        let glued = prev.is_some_and(|p| is_handle_char(p) || p == '@');
        prev = Some(c);
        if c != '@' || glued {
            continue;
        }

        let rest = &text[start + 1..];
        if !rest.starts_with(|first: char| first.is_ascii_alphabetic()) {
            continue;
        }
        let len = rest
            .find(|ch: char| !is_handle_char(ch))
            .unwrap_or(rest.len());
        let handle = &rest[..len.min(MAX_HANDLE_LEN)];

        if !mentions.iter().any(|m| m == handle) {
            mentions.push(handle.to_string());
        }

        for _ in 0..len {
            if let Some((_, ch)) = chars.next() {
                prev = Some(ch);
            }
        }
    }

    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_mentions_in_order() {
        assert_eq!(
            extract_mentions("hi @bob and @alice_1, also @bob"),
            vec!["bob", "alice_1"]
        );
    }

    #[test]
    fn test_differently_cased_handles_are_distinct() {
        assert_eq!(extract_mentions("hey @Bob and @bob, @bob"), vec!["Bob", "bob"]);
    }

    #[test]
    fn test_ignores_emails_and_bare_at() {
        assert!(extract_mentions("mail me at john@example.org").is_empty());
        assert!(extract_mentions("@ nobody @1abc @@x").is_empty());
    }

    #[test]
    fn test_mention_at_start_and_end() {
        assert_eq!(extract_mentions("@ann"), vec!["ann"]);
        assert_eq!(extract_mentions("(@ann)"), vec!["ann"]);
    }

    #[test]
    fn test_long_handle_is_truncated() {
        let text = format!("@{}", "a".repeat(30));
        assert_eq!(extract_mentions(&text), vec!["a".repeat(MAX_HANDLE_LEN)]);
    }

    #[test]
    fn test_non_ascii_text_around_mentions() {
        assert_eq!(extract_mentions("¡hola @josé!"), vec!["jos"]);
    }
}
