use std::sync::LazyLock;

use regex::Regex;

/// `[J] <id>`, `J: <id>`, `J：<id>` or `J <id>` at the start of a line.
pub static QUESTION_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[J\]\s*(\S+)|^\s*J[:：\s]+(\S+)").unwrap());

/// Lines attributed to one prospective question. The first line is always
/// the question-start marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub lines: Vec<String>,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The id token carried by a question-start line, if the line is one.
pub fn question_start(line: &str) -> Option<&str> {
    let caps = QUESTION_START_RE.captures(line)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Partition normalized lines into one block per question-start marker.
/// Lines before the first marker belong to no block and are dropped.
pub fn split_blocks(lines: &[String]) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut current: Option<Block> = None;
    let mut preamble = 0usize;

    for line in lines {
        if question_start(line).is_some() {
            if let Some(block) = current.take().filter(|b| !b.is_empty()) {
                blocks.push(block);
            }
            current = Some(Block::default());
        }
        match current.as_mut() {
            Some(block) => block.lines.push(line.clone()),
            None => preamble += 1,
        }
    }

    if let Some(block) = current.filter(|b| !b.is_empty()) {
        blocks.push(block);
    }

    if preamble > 0 {
        tracing::debug!(lines = preamble, "dropped text before first question marker");
    }

    blocks
}
