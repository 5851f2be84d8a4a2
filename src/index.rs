use crate::document::Passage;
use crate::error::{QaError, Result};
use std::collections::HashMap;

const BM25_K1: f32 = 1.5;
const BM25_B: f32 = 0.75;

/// Lowercase whitespace tokenization. No stemming, no stop words —
/// determinism over recall.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// One entry in a term's postings list.
#[derive(Debug, Clone)]
struct Posting {
    passage_idx: u32,
    term_frequency: u32,
}

/// A ranked (rank, passage) pair produced by a query.
#[derive(Debug, Clone)]
pub struct RetrievalHit<'a> {
    /// 0-based position in the top-k ordering; citation tags are `rank + 1`.
    pub rank: usize,
    pub score: f32,
    pub passage: &'a Passage,
}

/// BM25 ranking index over a passage collection. Built once, read-only;
/// position `i` corresponds exactly to passage `i`.
#[derive(Debug)]
pub struct Bm25Index {
    postings: HashMap<String, Vec<Posting>>,
    passage_lengths: Vec<u32>,
    avg_passage_length: f32,
}

impl Bm25Index {
    /// Tokenize every passage and build the postings table. An empty
    /// collection is a precondition failure: a degenerate index would make
    /// every downstream answer silently empty.
    pub fn build(passages: &[Passage]) -> Result<Self> {
        if passages.is_empty() {
            return Err(QaError::EmptyCorpus);
        }

        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut passage_lengths = Vec::with_capacity(passages.len());

        for (idx, passage) in passages.iter().enumerate() {
            let tokens = tokenize(&passage.text);
            passage_lengths.push(tokens.len() as u32);

            let mut tf_map: HashMap<&str, u32> = HashMap::new();
            for token in tokens.iter() {
                *tf_map.entry(token).or_insert(0) += 1;
            }
            for (term, tf) in tf_map {
                postings.entry(term.to_string()).or_default().push(Posting {
                    passage_idx: idx as u32,
                    term_frequency: tf,
                });
            }
        }

        let total: u64 = passage_lengths.iter().map(|&l| l as u64).sum();
        let avg_passage_length = total as f32 / passage_lengths.len() as f32;

        Ok(Self {
            postings,
            passage_lengths,
            avg_passage_length,
        })
    }

    pub fn len(&self) -> usize {
        self.passage_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passage_lengths.is_empty()
    }

    /// BM25 Okapi scores for every passage, dense and indexed by passage
    /// position.
    pub fn score_all(&self, query: &str) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.passage_lengths.len()];
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return scores;
        }

        let n = self.passage_lengths.len() as f32;
        let avgdl = self.avg_passage_length;

        for token in query_tokens.iter() {
            if let Some(postings) = self.postings.get(token.as_str()) {
                let df = postings.len() as f32;
                // IDF: log((N - df + 0.5) / (df + 0.5) + 1)
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

                for posting in postings {
                    let dl = self.passage_lengths[posting.passage_idx as usize] as f32;
                    let tf = posting.term_frequency as f32;
                    let tf_norm =
                        (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * dl / avgdl));
                    scores[posting.passage_idx as usize] += idf * tf_norm;
                }
            }
        }

        scores
    }

    /// Top-k passages for a query, descending score. Ties break by
    /// ascending passage index so identical inputs always produce identical
    /// output. `k == 0` returns an empty vec; `k` past the collection size
    /// returns the whole collection ranked.
    pub fn retrieve<'a>(
        &self,
        passages: &'a [Passage],
        query: &str,
        k: usize,
    ) -> Vec<RetrievalHit<'a>> {
        debug_assert_eq!(passages.len(), self.passage_lengths.len());
        if k == 0 {
            return vec![];
        }

        let scores = self.score_all(query);
        let mut order: Vec<usize> = (0..scores.len()).collect();
        // Stable sort: equal scores keep ascending passage order.
        order.sort_by(|&a, &b| {
            scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal)
        });
        order.truncate(k);

        order
            .into_iter()
            .enumerate()
            .map(|(rank, idx)| RetrievalHit {
                rank,
                score: scores[idx],
                passage: &passages[idx],
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(text: &str) -> Passage {
        Passage {
            text: text.to_string(),
            document: "test.txt".to_string(),
            page: None,
        }
    }

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(tokenize("The Quick  Fox"), vec!["the", "quick", "fox"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn build_rejects_empty_collection() {
        assert!(matches!(Bm25Index::build(&[]), Err(QaError::EmptyCorpus)));
    }

    #[test]
    fn score_vector_is_dense_over_all_passages() {
        let passages = vec![passage("alpha beta"), passage("gamma delta"), passage("alpha")];
        let index = Bm25Index::build(&passages).unwrap();
        let scores = index.score_all("alpha");
        assert_eq!(scores.len(), 3);
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
        assert!(scores[2] > 0.0);
    }
}
