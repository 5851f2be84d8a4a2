use crate::index::RetrievalHit;

/// Per-passage ceiling inside the prompt, so context growth stays bounded.
pub const MAX_SNIPPET_CHARS: usize = 2000;

/// Render ranked hits into the numbered context block fed to the generator.
/// Each hit becomes `[n]` (paged sources add `p.<page> <document>`) followed
/// by the passage text capped at the snippet ceiling; blocks are joined with
/// a blank line in hit order.
pub fn format_context(hits: &[RetrievalHit]) -> String {
    let blocks: Vec<String> = hits
        .iter()
        .map(|hit| {
            let tag = match hit.passage.page {
                Some(page) => format!("[{}] p.{} {}", hit.rank + 1, page, hit.passage.document),
                None => format!("[{}]", hit.rank + 1),
            };
            format!("{} {}", tag, truncate_chars(&hit.passage.text, MAX_SNIPPET_CHARS))
        })
        .collect();
    blocks.join("\n\n")
}

/// Canonical citation labels mirroring the context tags, one per hit. The
/// answer pipeline appends these verbatim so every answer carries a
/// verifiable source list regardless of what the generator echoes back.
pub fn source_labels(hits: &[RetrievalHit]) -> Vec<String> {
    hits.iter()
        .map(|hit| {
            let page = match hit.passage.page {
                Some(p) => format!(" p.{}", p),
                None => String::new(),
            };
            let doc = if hit.passage.document.is_empty() {
                String::new()
            } else {
                format!(" {}", hit.passage.document)
            };
            format!("[{}{}{}]", hit.rank + 1, page, doc)
        })
        .collect()
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
