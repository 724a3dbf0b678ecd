//! Splits long replies into platform-sized chunks on whitespace boundaries.

/// Split `text` into chunks of at most `limit` bytes, cutting at the last
/// whitespace inside each window so words stay intact. When a window holds
/// no whitespace at all the cut falls back to the full limit. Cuts never
/// land inside a UTF-8 code point, and no produced chunk is empty.
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if rest.len() <= limit {
            let tail = rest.trim();
            if !tail.is_empty() {
                chunks.push(tail.to_string());
            }
            break;
        }

        let mut window = floor_char_boundary(rest, limit);
        if window == 0 {
            // Single char wider than the limit; emit it rather than stall.
            window = rest
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(rest.len());
        }

        let slice = &rest[..window];
        match slice.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
            Some((idx, ws)) => {
                let chunk = slice[..idx].trim();
                if !chunk.is_empty() {
                    chunks.push(chunk.to_string());
                }
                rest = &rest[idx + ws.len_utf8()..];
            },
            None => {
                chunks.push(slice.to_string());
                rest = &rest[window..];
            },
        }
    }

    chunks
}

/// Largest index `<= at` that falls on a char boundary of `text`.
fn floor_char_boundary(text: &str, at: usize) -> usize {
    let mut index = at.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
