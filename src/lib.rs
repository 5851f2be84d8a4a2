pub mod answer;
pub mod context;
pub mod document;
pub mod error;
pub mod eval;
pub mod index;
pub mod llm;

pub use answer::QaEngine;
pub use document::{load_pdf_corpus, load_pdf_group, load_text_corpus, Passage};
pub use error::{QaError, Result};
pub use eval::{EvalSummary, Judge, QuestionSet};
pub use index::{Bm25Index, RetrievalHit};
pub use llm::{Generator, LlmClient};
