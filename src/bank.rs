use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::BankError;
use crate::record::{normalize_answer, COLUMNS, OPTION_LETTERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multiple,
}

impl QuestionKind {
    /// More than one answer letter means a multiple-answer question.
    pub fn classify(answer: &str) -> Self {
        if answer.chars().count() > 1 {
            QuestionKind::Multiple
        } else {
            QuestionKind::Single
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Some(QuestionKind::Single),
            "multiple" => Some(QuestionKind::Multiple),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: String,
    pub chapter: String,
    pub code: String,
    pub question: String,
    pub correct_answer: String,
    pub options: BTreeMap<char, String>,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
}

#[derive(Debug)]
pub struct Category {
    pub name: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub total: usize,
    pub single: usize,
    pub multiple: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub kind: Option<QuestionKind>,
    pub limit: Option<usize>,
    pub shuffle: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerCheck {
    pub correct: bool,
    pub correct_answer: String,
    pub user_answer: String,
}

/// Read-only view over the extracted CSV files.
#[derive(Debug, Default)]
pub struct QuestionBank {
    categories: Vec<Category>,
}

impl QuestionBank {
    /// Load every configured category whose CSV exists. Unreadable files and
    /// bad rows are logged and skipped.
    pub fn load(settings: &Settings) -> Self {
        let mut categories = Vec::new();
        for src in &settings.sources {
            let path = settings.csv_path(src);
            if !path.exists() {
                info!(path = %path.display(), "question file not found");
                continue;
            }
            match load_csv(&path) {
                Ok(questions) => {
                    info!(category = %src.category, count = questions.len(), "loaded");
                    categories.push(Category {
                        name: src.category.clone(),
                        questions,
                    });
                }
                Err(e) => warn!(error = %e, "skipping category {}", src.category),
            }
        }
        QuestionBank { categories }
    }

    pub fn total(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }

    pub fn categories(&self) -> Vec<CategorySummary> {
        self.categories
            .iter()
            .map(|c| {
                let multiple = c
                    .questions
                    .iter()
                    .filter(|q| q.kind == QuestionKind::Multiple)
                    .count();
                CategorySummary {
                    name: c.name.clone(),
                    total: c.questions.len(),
                    single: c.questions.len() - multiple,
                    multiple,
                }
            })
            .collect()
    }

    fn category(&self, name: &str) -> Result<&Category, BankError> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| BankError::UnknownCategory(name.to_string()))
    }

    fn matching(&self, category: &str, kind: Option<QuestionKind>) -> Result<Vec<&Question>, BankError> {
        let cat = self.category(category)?;
        Ok(cat
            .questions
            .iter()
            .filter(|q| kind.map_or(true, |k| q.kind == k))
            .collect())
    }

    /// Filter by kind, then shuffle, then truncate.
    pub fn questions(&self, category: &str, query: &Query) -> Result<Vec<&Question>, BankError> {
        let mut found = self.matching(category, query.kind)?;
        if query.shuffle {
            found.shuffle(&mut rand::thread_rng());
        }
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    pub fn question(&self, category: &str, id: &str) -> Result<&Question, BankError> {
        self.category(category)?
            .questions
            .iter()
            .find(|q| q.id == id)
            .ok_or_else(|| BankError::UnknownQuestion {
                category: category.to_string(),
                id: id.to_string(),
            })
    }

    /// Up to `count` distinct questions, picked at random.
    pub fn random(
        &self,
        category: &str,
        count: usize,
        kind: Option<QuestionKind>,
    ) -> Result<Vec<&Question>, BankError> {
        let found = self.matching(category, kind)?;
        Ok(found
            .choose_multiple(&mut rand::thread_rng(), count)
            .copied()
            .collect())
    }

    pub fn check_answer(&self, category: &str, id: &str, answer: &str) -> Result<AnswerCheck, BankError> {
        let q = self.question(category, id)?;
        let user_answer = answer.trim().to_uppercase();
        Ok(AnswerCheck {
            correct: user_answer == q.correct_answer,
            correct_answer: q.correct_answer.clone(),
            user_answer,
        })
    }
}

/// Read one extracted CSV. Column names are trimmed of whitespace and BOM;
/// rows missing a column or failing to decode are skipped.
pub fn load_csv(path: &Path) -> Result<Vec<Question>, BankError> {
    let csv_err = |source| BankError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let columns: HashMap<String, usize> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim_matches(|c: char| c == '\u{feff}' || c.is_whitespace()).to_string(), i))
        .collect();

    let mut questions = Vec::new();
    for (n, row) in reader.records().enumerate() {
        let row_num = n + 1;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(row = row_num, error = %e, "skipping unreadable row");
                continue;
            }
        };
        match question_from_row(&columns, &row) {
            Ok(q) => questions.push(q),
            Err(missing) => {
                let mut available: Vec<&str> = columns.keys().map(String::as_str).collect();
                available.sort_unstable();
                warn!(row = row_num, column = missing, ?available, "skipping row with missing column");
            }
        }
    }
    Ok(questions)
}

/// Builds a question, or names the first required column the row lacks.
fn question_from_row(
    columns: &HashMap<String, usize>,
    row: &csv::StringRecord,
) -> Result<Question, &'static str> {
    let cell = |name: &'static str| -> Result<&str, &'static str> {
        columns
            .get(name)
            .and_then(|&i| row.get(i))
            .ok_or(name)
    };
    for name in COLUMNS {
        cell(name)?;
    }

    let correct_answer = normalize_answer(cell("T")?);
    let mut options = BTreeMap::new();
    for (letter, name) in OPTION_LETTERS.iter().zip(&COLUMNS[5..]) {
        options.insert(*letter, cell(*name)?.to_string());
    }

    Ok(Question {
        id: cell("J")?.to_string(),
        chapter: cell("P")?.to_string(),
        code: cell("I")?.to_string(),
        question: cell("Q")?.to_string(),
        kind: QuestionKind::classify(&correct_answer),
        correct_answer,
        options,
    })
}
