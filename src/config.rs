use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// One question bank: its category name and the PDF it comes from.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub category: String,
    pub file: String,
}

impl Source {
    fn new(category: &str) -> Self {
        Source {
            category: category.to_string(),
            file: format!("{}.pdf", category),
        }
    }

    /// `A类题库.pdf` -> `A类题库_extracted.csv`
    pub fn csv_name(&self) -> String {
        let stem = Path::new(&self.file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file);
        format!("{}_extracted.csv", stem)
    }
}

/// Loaded once at startup and handed to whatever needs it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub pdf_dir: PathBuf,
    pub csv_dir: PathBuf,
    pub sources: Vec<Source>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pdf_dir: PathBuf::from("QB_PDF"),
            csv_dir: PathBuf::from("QB_CSV"),
            sources: ["A类题库", "B类题库", "C类题库", "总题库"]
                .into_iter()
                .map(Source::new)
                .collect(),
        }
    }
}

impl Settings {
    /// Defaults, then `qbank.toml` (or `path`), then `QBANK_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("qbank").required(false),
        };
        let settings = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("QBANK"))
            .build()
            .context("loading configuration")?
            .try_deserialize::<Settings>()
            .context("invalid configuration")?;
        Ok(settings)
    }

    pub fn pdf_path(&self, source: &Source) -> PathBuf {
        self.pdf_dir.join(&source.file)
    }

    pub fn csv_path(&self, source: &Source) -> PathBuf {
        self.csv_dir.join(source.csv_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.sources.len(), 4);
        assert_eq!(s.sources[3].file, "总题库.pdf");
        assert_eq!(s.csv_path(&s.sources[0]), PathBuf::from("QB_CSV/A类题库_extracted.csv"));
        assert_eq!(s.pdf_path(&s.sources[1]), PathBuf::from("QB_PDF/B类题库.pdf"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.toml");
        std::fs::write(
            &path,
            "csv_dir = \"out\"\n\n[[sources]]\ncategory = \"Demo\"\nfile = \"demo.pdf\"\n",
        )
        .unwrap();
        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.pdf_dir, PathBuf::from("QB_PDF"));
        assert_eq!(s.csv_dir, PathBuf::from("out"));
        assert_eq!(s.sources.len(), 1);
        assert_eq!(s.sources[0].csv_name(), "demo_extracted.csv");
    }
}
