//! Text cleanup for inbound Discord messages.

use {once_cell::sync::Lazy, regex::Regex};

static MARKDOWN_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\*{1,3}|_{2,3}|~~|`{1,3}|\|\|)").unwrap());

static QUOTE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^>\s?").unwrap());

/// Remove the bot's own mention tokens (`<@id>` and `<@!id>`) from `text`.
///
/// Other users' mentions stay in place so the assistant sees who the
/// message talks about.
pub fn strip_mentions(text: &str, bot_user_id: Option<u64>) -> String {
    let Some(id) = bot_user_id else {
        return text.to_string();
    };
    text.replace(&format!("<@{id}>"), "")
        .replace(&format!("<@!{id}>"), "")
}

/// Strip markdown formatting markers, leaving the plain words.
///
/// Single underscores survive so snake_case identifiers stay readable.
pub fn strip_markdown(text: &str) -> String {
    let text = MARKDOWN_MARKERS.replace_all(text, "");
    QUOTE_PREFIX.replace_all(&text, "").into_owned()
}

/// Full inbound cleanup: drop the bot mention, then the markup, then trim.
pub fn clean_content(text: &str, bot_user_id: Option<u64>) -> String {
    strip_markdown(&strip_mentions(text, bot_user_id))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_the_bot_mention_only() {
        let text = "<@42> ask <@99> about it";
        assert_eq!(strip_mentions(text, Some(42)), " ask <@99> about it");
    }

    #[test]
    fn strips_nickname_style_mentions() {
        assert_eq!(strip_mentions("<@!42> hello", Some(42)), " hello");
    }

    #[test]
    fn unknown_bot_id_leaves_text_alone() {
        assert_eq!(strip_mentions("<@42> hi", None), "<@42> hi");
    }

    #[test]
    fn markdown_markers_are_removed() {
        assert_eq!(strip_markdown("**bold** and *italic* and `code`"), "bold and italic and code");
    }

    #[test]
    fn quote_prefixes_are_removed() {
        assert_eq!(strip_markdown("> quoted line\nplain"), "quoted line\nplain");
    }

    #[test]
    fn snake_case_survives() {
        assert_eq!(strip_markdown("call foo_bar please"), "call foo_bar please");
    }

    #[test]
    fn clean_content_combines_and_trims() {
        assert_eq!(clean_content("<@42>  what is **this**? ", Some(42)), "what is this?");
    }
}
