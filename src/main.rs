mod bank;
mod config;
mod error;
mod export;
mod parser;
mod record;
mod source;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use bank::{Query, QuestionBank, QuestionKind};
use config::Settings;
use source::{PdfText, PlainText, TextSource};

#[derive(Parser)]
#[command(name = "ham_qbank", about = "Amateur-radio exam question bank extractor")]
struct Cli {
    /// Config file (default: ./qbank.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every configured PDF bank to CSV
    Extract {
        /// Directory holding the PDF banks
        #[arg(long)]
        pdf_dir: Option<PathBuf>,
        /// Directory to write CSV files into
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// Extract a single PDF to CSV
    Convert {
        pdf: PathBuf,
        /// Output CSV (default: <pdf stem>_extracted.csv next to the PDF)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse already-extracted text into CSV
    Parse {
        text: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Question counts per category
    Stats,
    /// List questions from a category
    Show {
        category: String,
        /// single or multiple
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long)]
        shuffle: bool,
        /// Show one question by id
        #[arg(long)]
        id: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Random questions from a category, as JSON
    Random {
        #[arg(default_value = "总题库")]
        category: String,
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
    /// Check an answer
    Check {
        category: String,
        id: String,
        answer: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Extract { pdf_dir, csv_dir } => {
            if let Some(dir) = pdf_dir {
                settings.pdf_dir = dir;
            }
            if let Some(dir) = csv_dir {
                settings.csv_dir = dir;
            }
            println!(
                "Extracting {} banks from {}...",
                settings.sources.len(),
                settings.pdf_dir.display()
            );
            let report = export::run_batch(&PdfText, &settings);
            report.print();
            Ok(())
        }
        Commands::Convert { pdf, output } => convert_one(&PdfText, pdf, output),
        Commands::Parse { text, output } => convert_one(&PlainText, text, output),
        Commands::Stats => {
            let bank = QuestionBank::load(&settings);
            if bank.total() == 0 {
                println!("No questions loaded. Run 'extract' first.");
                return Ok(());
            }
            println!("{:<16} | {:>6} | {:>6} | {:>8}", "Category", "Total", "Single", "Multiple");
            println!("{}", "-".repeat(46));
            for c in bank.categories() {
                println!(
                    "{:<16} | {:>6} | {:>6} | {:>8}",
                    clip(&c.name, 16),
                    c.total,
                    c.single,
                    c.multiple
                );
            }
            println!("\n{} questions", bank.total());
            Ok(())
        }
        Commands::Show { category, kind, limit, shuffle, id, json } => {
            let bank = QuestionBank::load(&settings);
            if let Some(id) = id {
                let q = bank.question(&category, &id)?;
                println!("{}", serde_json::to_string_pretty(q)?);
                return Ok(());
            }
            let query = Query {
                kind: parse_kind(kind.as_deref())?,
                limit,
                shuffle,
            };
            let questions = bank.questions(&category, &query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&questions)?);
                return Ok(());
            }
            println!("{:>3} | {:<12} | {:<48} | {:<4} | {:<8}", "#", "Id", "Question", "Ans", "Type");
            println!("{}", "-".repeat(88));
            for (i, q) in questions.iter().enumerate() {
                let kind = match q.kind {
                    QuestionKind::Single => "single",
                    QuestionKind::Multiple => "multiple",
                };
                println!(
                    "{:>3} | {:<12} | {:<48} | {:<4} | {:<8}",
                    i + 1,
                    clip(&q.id, 12),
                    clip(&q.question, 48),
                    q.correct_answer,
                    kind
                );
            }
            println!("\n{} questions in {}", questions.len(), category);
            Ok(())
        }
        Commands::Random { category, count, kind } => {
            let bank = QuestionBank::load(&settings);
            let questions = bank.random(&category, count, parse_kind(kind.as_deref())?)?;
            let body = serde_json::json!({
                "category": category,
                "total": questions.len(),
                "questions": questions,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Commands::Check { category, id, answer } => {
            let bank = QuestionBank::load(&settings);
            let check = bank.check_answer(&category, &id, &answer)?;
            if check.correct {
                println!("Correct: {}", check.correct_answer);
            } else {
                println!(
                    "Wrong: you answered {}, the correct answer is {}",
                    check.user_answer, check.correct_answer
                );
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", elapsed_label(elapsed));
    }

    result
}

fn convert_one(source: &dyn TextSource, input: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());
        input.with_file_name(format!("{}_extracted.csv", stem))
    });
    let count = export::extract_file(source, &input, &output)
        .with_context(|| format!("extracting {}", input.display()))?;
    println!(
        "Extracted {} records from {} -> {}",
        count,
        input.display(),
        output.display()
    );
    Ok(())
}

fn parse_kind(kind: Option<&str>) -> anyhow::Result<Option<QuestionKind>> {
    match kind {
        None => Ok(None),
        Some(k) => match QuestionKind::parse(k) {
            Some(kind) => Ok(Some(kind)),
            None => bail!("unknown question type '{}' (expected single or multiple)", k),
        },
    }
}

/// Fit `s` into a table column of `width` characters, marking a cut with `…`.
fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn elapsed_label(d: Duration) -> String {
    match d.as_secs() {
        s if s < 60 => format!("{:.1}s", d.as_secs_f64()),
        s => {
            let (h, m) = (s / 3600, s / 60 % 60);
            if h > 0 {
                format!("{}h{:02}m{:02}s", h, m, s % 60)
            } else {
                format!("{}m{:02}s", m, s % 60)
            }
        }
    }
}
