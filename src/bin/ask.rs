use clap::{ArgGroup, Parser};
use docask::{Bm25Index, LlmClient, QaEngine, QaError};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "docask", about = "Ask a cited question against a document corpus", version)]
#[command(group(ArgGroup::new("input").required(true).args(["pdf", "corpus", "group"])))]
struct Cli {
    /// Path to a short PDF file
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Path to a plain text file (blank-line paragraphs)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Path to a directory containing multiple reference PDFs
    #[arg(long)]
    group: Option<PathBuf>,

    /// Your question
    #[arg(long)]
    ask: String,

    /// Top-k passages to retrieve
    #[arg(long, default_value_t = 6)]
    k: usize,

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

    let passages = if let Some(path) = &cli.pdf {
        docask::load_pdf_corpus(path)?
    } else if let Some(path) = &cli.corpus {
        docask::load_text_corpus(path)?
    } else if let Some(path) = &cli.group {
        docask::load_pdf_group(path)?
    } else {
        unreachable!("clap enforces one input source");
    };

    if passages.is_empty() {
        return Err(QaError::EmptyCorpus);
    }
    log::info!("Loaded {} passages", passages.len());

    let index = Bm25Index::build(&passages)?;
    let client = LlmClient::new(&cli.model, &api_key)?;
    let engine = QaEngine::new(&passages, &index, &client);

    println!("{}", engine.answer(&cli.ask, cli.k)?);
    Ok(())
}
