pub mod fields;
pub mod segment;

use crate::record::QuestionRecord;

/// Split extracted text into lines, stripping byte-order marks and trailing
/// whitespace. Blank lines are kept.
pub fn normalize_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_matches('\u{feff}').trim_end().to_string())
        .collect()
}

/// Three-pass pipeline: text → lines → blocks → records, in input order.
pub fn parse_text(text: &str) -> Vec<QuestionRecord> {
    let lines = normalize_lines(text);
    let blocks = segment::split_blocks(&lines);
    let total = blocks.len();
    let records: Vec<_> = blocks.iter().filter_map(fields::parse_block).collect();
    tracing::debug!(
        blocks = total,
        records = records.len(),
        dropped = total - records.len(),
        "parsed question blocks"
    );
    records
}
