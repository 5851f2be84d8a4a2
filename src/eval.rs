use crate::answer::QaEngine;
use crate::error::{QaError, Result};
use crate::llm::Generator;
use indicatif::ProgressBar;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

lazy_static! {
    /// Citation tags like `[1]` or `[2 p.7]`. The grammar is bit-exact:
    /// bracketed 1-based index, optional whitespace + `p.` + page number.
    static ref CITATION_RE: Regex = Regex::new(r"\[\d+(\s*p\.\d+)?\]").unwrap();
    static ref JUDGE_SCORE_RE: Regex = Regex::new(r"[1-5]").unwrap();
}

const JUDGE_PROMPT: &str = "You are a strict evaluator. Score 1-5 how well the answer is grounded in its cited context markers like [1] or [2 p.7].
Higher is better:
1 = hallucinated / not grounded
3 = partially grounded, some unsupported claims
5 = fully grounded; precise and supported by citations

An answer that states it lacks sufficient context and cites nothing is acceptable.

Question: {q}

Answer:
{a}

Return ONLY an integer 1-5.
";

/// One labeled evaluation question, one JSON object per input line.
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub expected_keywords: Vec<String>,
    pub document: String,
}

/// A grounding rating from the judging collaborator, guaranteed in 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgeScore(u8);

impl JudgeScore {
    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Optional judging collaborator, resolved once at startup instead of
/// feature-detected inside the scoring loop.
pub enum Judge<G: Generator> {
    Enabled(G),
    Disabled,
}

impl<G: Generator> Judge<G> {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Judge::Enabled(_))
    }

    /// Rate an answer's grounding. Unavailable or unparseable grading
    /// yields `None`, never an abort; absent scores stay out of averages.
    pub fn score(&self, question: &str, answer: &str) -> Option<JudgeScore> {
        let Judge::Enabled(generator) = self else {
            return None;
        };

        let prompt = JUDGE_PROMPT.replace("{q}", question).replace("{a}", answer);
        let raw = match generator.complete(&prompt) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("Judge call failed: {}", err);
                return None;
            }
        };

        JUDGE_SCORE_RE
            .find(raw.trim())
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .and_then(JudgeScore::new)
    }
}

/// One row of evaluation output. Written once per question, never mutated.
#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub question_id: String,
    pub expected_source: String,
    pub has_citation: bool,
    pub keyword_hit_count: usize,
    pub keyword_coverage: f64,
    pub has_correct_source: bool,
    pub judge: Option<JudgeScore>,
}

#[derive(Debug, Serialize)]
struct AnswerRow<'a> {
    qid: &'a str,
    question: &'a str,
    answer: &'a str,
}

/// True if the text carries at least one citation tag.
pub fn has_citation(answer: &str) -> bool {
    CITATION_RE.is_match(answer)
}

/// Count of expected keywords present in the answer, case-insensitive
/// substring match.
pub fn keyword_hits(answer: &str, keywords: &[String]) -> usize {
    if keywords.is_empty() {
        return 0;
    }
    let answer = answer.to_lowercase();
    keywords
        .iter()
        .filter(|k| answer.contains(&k.to_lowercase()))
        .count()
}

/// Hit count over max(1, expected count), rounded to 3 decimals. The max
/// guard keeps an empty keyword list at coverage 0 instead of undefined.
pub fn keyword_coverage(hit_count: usize, expected_count: usize) -> f64 {
    let cov = hit_count as f64 / expected_count.max(1) as f64;
    (cov * 1000.0).round() / 1000.0
}

/// Questions parsed and ready to score.
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Parse a JSONL question file. A missing file is fatal; a malformed
    /// line is skipped with a warning since the rest of the batch is still
    /// valid signal.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| QaError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut questions = vec![];
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Question>(line) {
                Ok(q) => questions.push(q),
                Err(err) => {
                    log::warn!(
                        "Skipping malformed question on line {} of {}: {}",
                        line_no + 1,
                        path.display(),
                        err
                    );
                }
            }
        }

        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Score every question: answer, metrics, optional judge rating. A
    /// failed generation skips that row and the batch continues.
    pub fn score<G: Generator, J: Generator>(
        self,
        engine: &QaEngine<G>,
        judge: &Judge<J>,
        k: usize,
    ) -> ScoredBatch {
        let pb = ProgressBar::new(self.questions.len() as u64);
        let mut records = vec![];
        let mut answers = vec![];

        for q in self.questions {
            let ans = match engine.answer(&q.question, k) {
                Ok(ans) => ans,
                Err(err) => {
                    log::warn!("Generation failed for question {}: {}", q.id, err);
                    pb.inc(1);
                    continue;
                }
            };

            let hit_count = keyword_hits(&ans, &q.expected_keywords);
            records.push(EvaluationRecord {
                question_id: q.id.clone(),
                expected_source: q.document.clone(),
                has_citation: has_citation(&ans),
                keyword_hit_count: hit_count,
                keyword_coverage: keyword_coverage(hit_count, q.expected_keywords.len()),
                // Coarse by intent: the document id surfacing anywhere in
                // the rendered answer counts, numbering is not checked.
                has_correct_source: ans.contains(&q.document),
                judge: judge.score(&q.question, &ans),
            });
            answers.push((q.id, q.question, ans));
            pb.inc(1);
        }
        pb.finish_and_clear();

        ScoredBatch {
            records,
            answers,
            judged: judge.is_enabled(),
        }
    }
}

/// Scored rows awaiting persistence.
pub struct ScoredBatch {
    pub records: Vec<EvaluationRecord>,
    answers: Vec<(String, String, String)>,
    judged: bool,
}

impl ScoredBatch {
    /// Persist the summary CSV (fixed column order) and the paired answers
    /// JSONL, then fold the batch into aggregate metrics.
    pub fn write(self, csv_path: &Path) -> Result<EvalSummary> {
        let mut writer = csv::Writer::from_path(csv_path)?;

        let mut header = vec![
            "qid",
            "source",
            "has_citation",
            "keyword_hits",
            "keyword_coverage",
            "has_correct_source",
        ];
        if self.judged {
            header.push("judge_grounding_1to5");
        }
        writer.write_record(&header)?;

        for record in &self.records {
            let mut row = vec![
                record.question_id.clone(),
                record.expected_source.clone(),
                (record.has_citation as u8).to_string(),
                record.keyword_hit_count.to_string(),
                record.keyword_coverage.to_string(),
                (record.has_correct_source as u8).to_string(),
            ];
            if self.judged {
                // -1 keeps the output format of runs where judging failed
                row.push(record.judge.map(|s| s.value() as i8).unwrap_or(-1).to_string());
            }
            writer.write_record(&row)?;
        }
        writer.flush()?;

        let answers_path = answers_path_for(csv_path);
        let mut out = BufWriter::new(File::create(&answers_path)?);
        for (qid, question, answer) in &self.answers {
            let row = AnswerRow {
                qid,
                question,
                answer,
            };
            serde_json::to_writer(&mut out, &row)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        Ok(self.summarize(csv_path.to_path_buf(), answers_path))
    }

    fn summarize(&self, csv_path: PathBuf, answers_path: PathBuf) -> EvalSummary {
        let n = self.records.len();
        let (citation_rate, mean_keyword_coverage) = if n == 0 {
            (0.0, 0.0)
        } else {
            let cited = self.records.iter().filter(|r| r.has_citation).count();
            let coverage: f64 = self.records.iter().map(|r| r.keyword_coverage).sum();
            (cited as f64 / n as f64, coverage / n as f64)
        };

        let judged: Vec<u8> = self
            .records
            .iter()
            .filter_map(|r| r.judge.map(JudgeScore::value))
            .collect();
        let mean_judge_score = (!judged.is_empty())
            .then(|| judged.iter().map(|&s| s as f64).sum::<f64>() / judged.len() as f64);

        EvalSummary {
            citation_rate,
            mean_keyword_coverage,
            mean_judge_score,
            csv_path,
            answers_path,
        }
    }
}

/// Aggregate metrics over a written batch.
pub struct EvalSummary {
    pub citation_rate: f64,
    pub mean_keyword_coverage: f64,
    /// Mean over present judge scores only; `None` when nothing was judged.
    pub mean_judge_score: Option<f64>,
    pub csv_path: PathBuf,
    pub answers_path: PathBuf,
}

fn answers_path_for(csv_path: &Path) -> PathBuf {
    let stem = csv_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("summary");
    csv_path.with_file_name(format!("{}_answers.jsonl", stem))
}
