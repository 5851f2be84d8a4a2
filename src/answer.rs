use crate::context::{format_context, source_labels};
use crate::document::Passage;
use crate::error::Result;
use crate::index::Bm25Index;
use crate::llm::Generator;

/// Fixed instruction framing: answer only from the numbered context, cite
/// inline with the bracket tags, and admit insufficient context instead of
/// fabricating.
const PROMPT: &str = "You are a careful analyst. Answer ONLY using the numbered context.
Cite documents and pages inline like [1 p.5]. If the answer is not in context, say you lack sufficient context.

Question: {q}

Context: {ctx}

Answer with citations:
";

/// Everything an answer needs, constructed once per run: the immutable
/// passage collection, the index built over it, and the generation
/// collaborator. No implicit shared state crosses calls.
pub struct QaEngine<'a, G: Generator> {
    passages: &'a [Passage],
    index: &'a Bm25Index,
    generator: &'a G,
}

impl<'a, G: Generator> QaEngine<'a, G> {
    pub fn new(passages: &'a [Passage], index: &'a Bm25Index, generator: &'a G) -> Self {
        Self {
            passages,
            index,
            generator,
        }
    }

    /// Retrieve top-k passages, assemble the cited context, invoke the
    /// generator exactly once, and append the canonical `Sources:` section
    /// so every answer carries a verifiable citation list even when the
    /// generated text omits or malforms its inline citations.
    pub fn answer(&self, query: &str, k: usize) -> Result<String> {
        let hits = self.index.retrieve(self.passages, query, k);
        let ctx = format_context(&hits);
        let prompt = PROMPT.replace("{q}", query).replace("{ctx}", &ctx);

        let response = self.generator.complete(&prompt)?;
        let sources = source_labels(&hits);
        Ok(format!("{}\n\nSources:\n{}", response, sources.join("\n")))
    }
}
