use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{error, info};

use crate::config::{Settings, Source};
use crate::error::ExtractError;
use crate::parser;
use crate::record::{QuestionRecord, COLUMNS};
use crate::source::TextSource;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write a BOM, the fixed header and one row per record.
pub fn write_records<W: Write>(mut out: W, records: &[QuestionRecord]) -> Result<(), csv::Error> {
    out.write_all(UTF8_BOM)?;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(out);
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, records: &[QuestionRecord]) -> Result<(), ExtractError> {
    let io_err = |source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    write_records(BufWriter::new(file), records).map_err(|source| ExtractError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract one input file to CSV; returns the number of records written.
pub fn extract_file(
    source: &dyn TextSource,
    input: &Path,
    output: &Path,
) -> Result<usize, ExtractError> {
    let text = source.extract_text(input)?;
    let records = parser::parse_text(&text);
    write_csv_file(output, &records)?;
    Ok(records.len())
}

#[derive(Debug)]
pub enum FileOutcome {
    Written { count: usize },
    Skipped,
    Failed(ExtractError),
}

#[derive(Debug)]
pub struct FileReport {
    pub category: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn records(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.outcome {
                FileOutcome::Written { count } => count,
                _ => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed(_)))
            .count()
    }

    pub fn print(&self) {
        for f in &self.files {
            match &f.outcome {
                FileOutcome::Written { count } => println!(
                    "{}: {} records from {} -> {}",
                    f.category,
                    count,
                    f.input.display(),
                    f.output.display()
                ),
                FileOutcome::Skipped => {
                    println!("{}: skipped, {} not found", f.category, f.input.display())
                }
                FileOutcome::Failed(e) => println!("{}: failed: {}", f.category, e),
            }
        }
        println!(
            "Wrote {} records from {} files ({} failed).",
            self.records(),
            self.files
                .iter()
                .filter(|f| matches!(f.outcome, FileOutcome::Written { .. }))
                .count(),
            self.failures()
        );
    }
}

fn run_one(source: &dyn TextSource, settings: &Settings, src: &Source) -> FileReport {
    let input = settings.pdf_path(src);
    let output = settings.csv_path(src);

    let outcome = if !input.exists() {
        info!(path = %input.display(), "skipping missing file");
        FileOutcome::Skipped
    } else {
        match extract_file(source, &input, &output) {
            Ok(count) => {
                info!(category = %src.category, count, output = %output.display(), "extracted");
                FileOutcome::Written { count }
            }
            Err(e) => {
                error!(category = %src.category, error = %e, "extraction failed");
                FileOutcome::Failed(e)
            }
        }
    };

    FileReport {
        category: src.category.clone(),
        input,
        output,
        outcome,
    }
}

/// Extract every configured source. Files are independent, so they run in
/// parallel; a failure only affects its own file.
pub fn run_batch(source: &dyn TextSource, settings: &Settings) -> BatchReport {
    let pb = ProgressBar::new(settings.sources.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let files: Vec<FileReport> = settings
        .sources
        .par_iter()
        .map(|src| {
            let report = run_one(source, settings, src);
            pb.inc(1);
            report
        })
        .collect();

    pb.finish_and_clear();
    BatchReport { files }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;
    use crate::source::PlainText;

    fn record(id: &str, question: &str, answer: &str) -> QuestionRecord {
        let mut r = QuestionRecord::default();
        r.set(Field::J, id);
        r.append(Field::Q, question);
        r.set(Field::T, answer);
        r
    }

    #[test]
    fn header_and_bom() {
        let mut buf = Vec::new();
        write_records(&mut buf, &[]).unwrap();
        assert!(buf.starts_with(UTF8_BOM));
        assert_eq!(&buf[UTF8_BOM.len()..], b"J,P,I,Q,T,A,B,C,D\r\n");
    }

    #[test]
    fn round_trip_through_csv_reader() {
        let mut tricky = record("Q1", "Says \"hi\", then\nleaves", "AC");
        tricky.append(Field::A, "one, two");
        tricky.append(Field::B, "业余无线电");
        tricky.chapter = " padded ".into();
        let records = vec![tricky, record("Q2", "plain", "B")];

        let mut buf = Vec::new();
        write_records(&mut buf, &records).unwrap();

        let mut reader = csv::Reader::from_reader(&buf[UTF8_BOM.len()..]);
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, COLUMNS);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), records.len());
        for (row, rec) in rows.iter().zip(&records) {
            let cells: Vec<&str> = row.iter().collect();
            assert_eq!(cells, rec.to_row());
        }
    }

    #[test]
    fn extract_text_file_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out.csv");
        let n = extract_file(&PlainText, Path::new("tests/fixtures/sample_bank.txt"), &out).unwrap();
        assert_eq!(n, 5);
        let body = std::fs::read_to_string(&out).unwrap();
        assert!(body.starts_with('\u{feff}'));
        assert_eq!(body.lines().count(), 6);
    }

    #[test]
    fn batch_skips_missing_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let pdf_dir = dir.path().join("in");
        std::fs::create_dir_all(&pdf_dir).unwrap();
        std::fs::copy("tests/fixtures/sample_bank.txt", pdf_dir.join("good.txt")).unwrap();
        std::fs::create_dir_all(pdf_dir.join("dir.txt")).unwrap();

        let settings = Settings {
            pdf_dir,
            csv_dir: dir.path().join("out"),
            sources: vec![
                Source { category: "good".into(), file: "good.txt".into() },
                Source { category: "missing".into(), file: "missing.txt".into() },
                Source { category: "broken".into(), file: "dir.txt".into() },
            ],
        };

        let report = run_batch(&PlainText, &settings);
        let names: Vec<&str> = report.files.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(names, vec!["good", "missing", "broken"]);
        assert!(matches!(report.files[0].outcome, FileOutcome::Written { count: 5 }));
        assert!(matches!(report.files[1].outcome, FileOutcome::Skipped));
        assert!(matches!(report.files[2].outcome, FileOutcome::Failed(_)));
        assert_eq!(report.records(), 5);
        assert_eq!(report.failures(), 1);
        assert!(settings.csv_dir.join("good_extracted.csv").exists());
    }
}
