/// Tokens that ping entire channels. Messages carrying one are never relayed,
/// so a generated reply can't be provoked into a mass ping.
const BROADCAST_TOKENS: &[&str] = &["@everyone", "@here"];

/// Check whether a message contains a broadcast-style mention.
pub fn has_broadcast_mention(text: &str) -> bool {
    BROADCAST_TOKENS.iter().any(|token| text.contains(token))
}
