use docask::context::{format_context, source_labels};
use docask::document::segment_text;
use docask::index::Bm25Index;
use docask::llm::Generator;
use docask::{QaEngine, Result};
use std::cell::RefCell;

/// Records the prompt it was handed and replies with canned text.
struct RecordingGen {
    reply: String,
    seen: RefCell<Vec<String>>,
}

impl RecordingGen {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            seen: RefCell::new(vec![]),
        }
    }
}

impl Generator for RecordingGen {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.seen.borrow_mut().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

const RAW: &str = "Paris is the capital of France.\n\nBerlin is the capital of Germany.";

#[test]
fn two_paragraph_corpus_answers_with_the_right_citation() {
    let passages = segment_text(RAW, "");
    let index = Bm25Index::build(&passages).unwrap();

    let hits = index.retrieve(&passages, "capital of France", 1);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].passage.text, "Paris is the capital of France.");

    assert_eq!(format_context(&hits), "[1] Paris is the capital of France.");
    assert_eq!(source_labels(&hits), vec!["[1]"]);
}

#[test]
fn answer_appends_the_canonical_sources_section() {
    let passages = segment_text(RAW, "");
    let index = Bm25Index::build(&passages).unwrap();
    let generator = RecordingGen::new("Paris [1].");
    let engine = QaEngine::new(&passages, &index, &generator);

    let answer = engine.answer("capital of France", 1).unwrap();
    assert_eq!(answer, "Paris [1].\n\nSources:\n[1]");
}

#[test]
fn generator_is_invoked_exactly_once_with_the_assembled_context() {
    let passages = segment_text(RAW, "cities.txt");
    let index = Bm25Index::build(&passages).unwrap();
    let generator = RecordingGen::new("whatever");
    let engine = QaEngine::new(&passages, &index, &generator);

    engine.answer("capital of France", 2).unwrap();

    let seen = generator.seen.borrow();
    assert_eq!(seen.len(), 1);
    let prompt = &seen[0];
    assert!(prompt.contains("Question: capital of France"));
    assert!(prompt.contains("[1] Paris is the capital of France."));
    assert!(prompt.contains("[2] Berlin is the capital of Germany."));
    assert!(prompt.contains("Answer with citations:"));
}

#[test]
fn sources_carry_page_and_document_for_paged_passages() {
    use docask::document::Passage;

    let passages = vec![Passage {
        text: "Findings are summarized in the final section of the report.".to_string(),
        document: "report.pdf".to_string(),
        page: Some(3),
    }];
    let index = Bm25Index::build(&passages).unwrap();
    let generator = RecordingGen::new("Summarized findings [1 p.3].");
    let engine = QaEngine::new(&passages, &index, &generator);

    let answer = engine.answer("findings", 1).unwrap();
    assert!(answer.ends_with("Sources:\n[1 p.3 report.pdf]"));
}
