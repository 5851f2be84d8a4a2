use clap::Parser;
use docask::{Bm25Index, Judge, LlmClient, QaEngine, QaError, QuestionSet};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "docask-eval", about = "Score answer quality over a labeled question set", version)]
struct Cli {
    /// Path to the PDF group directory
    #[arg(long)]
    group: PathBuf,

    /// Question JSONL file
    #[arg(long, default_value = "eval/questions.jsonl")]
    qfile: PathBuf,

    /// Top-k passages to retrieve
    #[arg(long, default_value_t = 6)]
    k: usize,

    /// CSV output path
    #[arg(long, default_value = "eval/summary.csv")]
    out: PathBuf,

    /// Also rate grounding with an LLM judge
    #[arg(long)]
    judge: bool,

    /// Generation model name
    #[arg(long, default_value = docask::llm::DEFAULT_MODEL)]
    model: String,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> docask::Result<()> {
    let api_key = docask::llm::api_key_from_env()?;

    let passages = docask::load_pdf_group(&cli.group)?;
    if passages.is_empty() {
        return Err(QaError::EmptyCorpus);
    }
    log::info!("Loaded {} passages", passages.len());

    let index = Bm25Index::build(&passages)?;
    let client = LlmClient::new(&cli.model, &api_key)?;
    let engine = QaEngine::new(&passages, &index, &client);

    // Judge capability is resolved here, once, not inside the scoring loop.
    let judge = if cli.judge {
        Judge::Enabled(LlmClient::new(&cli.model, &api_key)?)
    } else {
        Judge::Disabled
    };

    let questions = QuestionSet::load(&cli.qfile)?;
    log::info!("Loaded {} questions from {}", questions.len(), cli.qfile.display());

    if let Some(parent) = cli.out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let summary = questions.score(&engine, &judge, cli.k).write(&cli.out)?;

    println!("Wrote {}", summary.csv_path.display());
    println!("Wrote {}", summary.answers_path.display());
    println!("- citation rate: {:.2}", summary.citation_rate);
    println!("- avg keyword coverage: {:.2}", summary.mean_keyword_coverage);
    if let Some(mean) = summary.mean_judge_score {
        println!("- avg judge grounding: {:.2}", mean);
    }
    Ok(())
}
