use std::sync::LazyLock;

use regex::Regex;

use super::segment::{question_start, Block};
use crate::record::{Field, QuestionRecord};

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\[(J|P|I|Q|T)\]\s*(.*)$").unwrap());
static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\[([ABCD])\]\s*(.*)$").unwrap());
static OPTION_ALT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([ABCD])[.)、．）]\s*(.*)$").unwrap());
static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(?:\[T\]|T[:：])\s*([ABCD])\s*$").unwrap());
static INLINE_ANSWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*T[:：]\s*([A-Da-d](?:[\s,，、/;；]*[A-Da-d])*)\s*$").unwrap());
static INLINE_META_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([PI])[:：]\s*(.*)$").unwrap());

/// Line recognizers, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    IdMarker,
    TaggedField,
    BracketOption,
    BareOption,
    Continuation,
    InlineTag,
}

/// What happens to the continuation cursor after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Track(Field),
    Clear,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Record id from a question-start marker. Later rules still see the line.
    SetId(String),
    /// Record id from a `[J]` tag, used only while no id is known.
    FillId(String),
    Set { field: Field, value: String, next: Next },
    Append { field: Field, text: String, next: Next },
}

impl Action {
    fn is_terminal(&self) -> bool {
        !matches!(self, Action::SetId(_))
    }
}

type Recognizer = fn(&str, Option<Field>) -> Option<Action>;

const RULES: [(Rule, Recognizer); 6] = [
    (Rule::IdMarker, id_marker),
    (Rule::TaggedField, tagged_field),
    (Rule::BracketOption, bracket_option),
    (Rule::BareOption, bare_option),
    (Rule::Continuation, continuation),
    (Rule::InlineTag, inline_tag),
];

fn id_marker(line: &str, _: Option<Field>) -> Option<Action> {
    question_start(line).map(|id| Action::SetId(id.to_string()))
}

fn tagged_field(line: &str, _: Option<Field>) -> Option<Action> {
    let caps = FIELD_RE.captures(line)?;
    let field = caps[1].chars().next().and_then(Field::from_letter)?;
    let content = caps[2].to_string();

    Some(match field {
        Field::J => Action::FillId(content),
        Field::T => match ANSWER_RE.captures(line) {
            Some(ans) => Action::Set {
                field: Field::T,
                value: ans[1].to_string(),
                next: Next::Clear,
            },
            None => Action::Append {
                field: Field::T,
                text: content,
                next: Next::Clear,
            },
        },
        tag => Action::Append {
            field: tag,
            text: content,
            next: Next::Track(tag),
        },
    })
}

fn bracket_option(line: &str, _: Option<Field>) -> Option<Action> {
    option_from(OPTION_RE.captures(line)?)
}

fn bare_option(line: &str, _: Option<Field>) -> Option<Action> {
    option_from(OPTION_ALT_RE.captures(line)?)
}

fn option_from(caps: regex::Captures<'_>) -> Option<Action> {
    let field = caps[1].chars().next().and_then(Field::from_letter)?;
    Some(Action::Append {
        field,
        text: caps[2].to_string(),
        next: Next::Track(field),
    })
}

fn continuation(line: &str, cursor: Option<Field>) -> Option<Action> {
    let field = cursor.filter(|f| f.accepts_continuation())?;
    Some(Action::Append {
        field,
        text: line.to_string(),
        next: Next::Keep,
    })
}

/// `T: B`, `T：A、C`, `P：2`, `I: 1` outside any continuation.
fn inline_tag(line: &str, _: Option<Field>) -> Option<Action> {
    if let Some(caps) = INLINE_ANSWER_RE.captures(line) {
        return Some(Action::Set {
            field: Field::T,
            value: caps[1].to_string(),
            next: Next::Clear,
        });
    }
    let caps = INLINE_META_RE.captures(line)?;
    let field = caps[1].chars().next().and_then(Field::from_letter)?;
    Some(Action::Append {
        field,
        text: caps[2].to_string(),
        next: Next::Keep,
    })
}

/// Run the recognizer table over one line. Returns every matching step up to
/// and including the first terminal one; an empty result means the line is
/// discarded.
pub fn dispatch(line: &str, cursor: Option<Field>) -> Vec<(Rule, Action)> {
    let mut steps = Vec::new();
    for (rule, recognize) in RULES {
        if let Some(action) = recognize(line, cursor) {
            let terminal = action.is_terminal();
            steps.push((rule, action));
            if terminal {
                break;
            }
        }
    }
    steps
}

/// Accumulates one block's lines into a record.
#[derive(Debug, Default)]
struct FieldParser {
    record: QuestionRecord,
    cursor: Option<Field>,
}

impl FieldParser {
    fn feed(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }
        for (_, action) in dispatch(line, self.cursor) {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::SetId(id) => self.record.set(Field::J, &id),
            Action::FillId(id) => {
                if self.record.id.is_empty() {
                    self.record.set(Field::J, &id);
                }
                self.cursor = None;
            }
            Action::Set { field, value, next } => {
                self.record.set(field, &value);
                self.advance(next);
            }
            Action::Append { field, text, next } => {
                self.record.append(field, &text);
                self.advance(next);
            }
        }
    }

    fn advance(&mut self, next: Next) {
        match next {
            Next::Track(field) => self.cursor = Some(field),
            Next::Clear => self.cursor = None,
            Next::Keep => {}
        }
    }

    fn finish(self) -> Option<QuestionRecord> {
        if self.record.id.is_empty() && self.record.question.is_empty() {
            return None;
        }
        Some(self.record)
    }
}

/// Parse one block into a record. Blocks with neither an id nor question
/// text yield nothing.
pub fn parse_block(block: &Block) -> Option<QuestionRecord> {
    let mut parser = FieldParser::default();
    for line in &block.lines {
        parser.feed(line);
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str) -> Block {
        Block {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    fn rules(line: &str, cursor: Option<Field>) -> Vec<Rule> {
        dispatch(line, cursor).into_iter().map(|(r, _)| r).collect()
    }

    #[test]
    fn rule_priority() {
        assert_eq!(rules("[J] Q1", None), vec![Rule::IdMarker, Rule::TaggedField]);
        assert_eq!(rules("J: Q1", None), vec![Rule::IdMarker]);
        assert_eq!(rules("[Q] text", Some(Field::A)), vec![Rule::TaggedField]);
        assert_eq!(rules("[B] 5 W", None), vec![Rule::BracketOption]);
        assert_eq!(rules("C. 5 W", Some(Field::Q)), vec![Rule::BareOption]);
        assert_eq!(rules("more text", Some(Field::Q)), vec![Rule::Continuation]);
        assert_eq!(rules("T: B", Some(Field::Q)), vec![Rule::Continuation]);
        assert_eq!(rules("T: B", None), vec![Rule::InlineTag]);
        assert_eq!(rules("P: 2", Some(Field::P)), vec![Rule::InlineTag]);
        assert!(rules("page 3 of 90", None).is_empty());
    }

    #[test]
    fn scenario_record() {
        let b = block("[J] Q1001\n[Q] What is the maximum power?\n[A] 100W\n[B] 200W\n[T] B");
        let r = parse_block(&b).unwrap();
        assert_eq!(
            r,
            QuestionRecord {
                id: "Q1001".into(),
                chapter: String::new(),
                code: String::new(),
                question: "What is the maximum power?".into(),
                correct_answer: "B".into(),
                options: ["100W".into(), "200W".into(), String::new(), String::new()],
            }
        );
    }

    #[test]
    fn continuation_joins_with_space() {
        let r = parse_block(&block("[J] 1\n[Q] Hello\nworld")).unwrap();
        assert_eq!(r.question, "Hello world");
    }

    #[test]
    fn option_continuation() {
        let r = parse_block(&block("[J] 1\n[Q] Pick one\n[A] first\nline two\n[B] second")).unwrap();
        assert_eq!(r.options[0], "first line two");
        assert_eq!(r.options[1], "second");
    }

    #[test]
    fn single_letter_answer() {
        let r = parse_block(&block("[J] 1\n[T] B")).unwrap();
        assert_eq!(r.correct_answer, "B");
    }

    #[test]
    fn multi_letter_answer() {
        let r = parse_block(&block("[J] 1\n[T] AC")).unwrap();
        assert_eq!(r.correct_answer, "AC");
    }

    #[test]
    fn answer_does_not_continue() {
        let r = parse_block(&block("[J] 1\n[T]\nAll of the above\n[Q] Which?")).unwrap();
        assert_eq!(r.correct_answer, "");
        assert_eq!(r.question, "Which?");
    }

    #[test]
    fn separated_answer_letters_kept() {
        for line in ["[T] A,C", "[T] A C", "[T] A、C", "[T] (AC)", "[T] 答案：A C"] {
            let r = parse_block(&block(&format!("[J] 1\n{}", line))).unwrap();
            assert_eq!(r.correct_answer, "AC", "line {:?}", line);
        }
    }

    #[test]
    fn inline_answer_forms() {
        let full_width = parse_block(&block("[J] 1\nT：B")).unwrap();
        assert_eq!(full_width.correct_answer, "B");
        let listed = parse_block(&block("[J] 1\nT：A、C")).unwrap();
        assert_eq!(listed.correct_answer, "AC");
        let comma = parse_block(&block("[J] 1\nT: a, d")).unwrap();
        assert_eq!(comma.correct_answer, "AD");
        let prose = parse_block(&block("[J] 1\nT: Be careful")).unwrap();
        assert_eq!(prose.correct_answer, "");
    }

    #[test]
    fn lowercase_answer_normalized() {
        let r = parse_block(&block("[J] 1\n[T] a c")).unwrap();
        assert_eq!(r.correct_answer, "AC");
    }

    #[test]
    fn bare_letter_options() {
        let r = parse_block(&block("J: 7\n[Q] Band?\nA. 2m\nB) 70cm\nC、6m\nD．10m")).unwrap();
        assert_eq!(r.id, "7");
        assert_eq!(r.options, ["2m", "70cm", "6m", "10m"].map(String::from));
    }

    #[test]
    fn inline_tags_outside_continuation() {
        let r = parse_block(&block("[J] 1\n[P] 3\nT: C\nI： 2\nP：extra")).unwrap();
        assert_eq!(r.correct_answer, "C");
        assert_eq!(r.code, "2");
        assert_eq!(r.chapter, "3 extra");
    }

    #[test]
    fn tagged_chapter_does_not_swallow_text() {
        let r = parse_block(&block("[J] 1\n[P] 2\nfooter noise\n[Q] q")).unwrap();
        assert_eq!(r.chapter, "2");
        assert_eq!(r.question, "q");
    }

    #[test]
    fn marker_id_wins_over_tag_content() {
        let r = parse_block(&block("[J] LK1039 extra words")).unwrap();
        assert_eq!(r.id, "LK1039");
    }

    #[test]
    fn later_marker_in_block_overwrites_id() {
        let b = Block {
            lines: vec!["[J] 1".into(), "[Q] q".into(), "J: 2".into()],
        };
        assert_eq!(parse_block(&b).unwrap().id, "2");
    }

    #[test]
    fn question_without_id_is_kept() {
        let r = parse_block(&block("[Q] orphan question")).unwrap();
        assert_eq!(r.id, "");
        assert_eq!(r.question, "orphan question");
    }

    #[test]
    fn blank_or_noise_block_dropped() {
        assert!(parse_block(&block("\n   \n")).is_none());
        assert!(parse_block(&block("page 3\n[A] option only")).is_none());
        assert!(parse_block(&Block::default()).is_none());
    }

    #[test]
    fn every_field_present() {
        let r = parse_block(&block("[J] 9")).unwrap();
        assert_eq!(r.to_row(), ["9", "", "", "", "", "", "", "", ""]);
    }
}
