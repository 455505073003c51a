use std::fmt;

/// CSV column order. Also the header row, verbatim.
pub const COLUMNS: [&str; 9] = ["J", "P", "I", "Q", "T", "A", "B", "C", "D"];

pub const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

const FIELDS: [Field; 9] = [
    Field::J,
    Field::P,
    Field::I,
    Field::Q,
    Field::T,
    Field::A,
    Field::B,
    Field::C,
    Field::D,
];

/// One slot of the fixed record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    J,
    P,
    I,
    Q,
    T,
    A,
    B,
    C,
    D,
}

impl Field {
    pub fn from_letter(c: char) -> Option<Field> {
        match c {
            'J' => Some(Field::J),
            'P' => Some(Field::P),
            'I' => Some(Field::I),
            'Q' => Some(Field::Q),
            'T' => Some(Field::T),
            'A' => Some(Field::A),
            'B' => Some(Field::B),
            'C' => Some(Field::C),
            'D' => Some(Field::D),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Field::J => 'J',
            Field::P => 'P',
            Field::I => 'I',
            Field::Q => 'Q',
            Field::T => 'T',
            Field::A => 'A',
            Field::B => 'B',
            Field::C => 'C',
            Field::D => 'D',
        }
    }

    /// Only question text and option text run over several lines.
    pub fn accepts_continuation(self) -> bool {
        matches!(self, Field::Q | Field::A | Field::B | Field::C | Field::D)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A parsed question. Every field is always present, empty when the source
/// text never set it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionRecord {
    pub id: String,
    pub chapter: String,
    pub code: String,
    pub question: String,
    pub correct_answer: String,
    pub options: [String; 4],
}

impl QuestionRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::J => &self.id,
            Field::P => &self.chapter,
            Field::I => &self.code,
            Field::Q => &self.question,
            Field::T => &self.correct_answer,
            Field::A => &self.options[0],
            Field::B => &self.options[1],
            Field::C => &self.options[2],
            Field::D => &self.options[3],
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::J => &mut self.id,
            Field::P => &mut self.chapter,
            Field::I => &mut self.code,
            Field::Q => &mut self.question,
            Field::T => &mut self.correct_answer,
            Field::A => &mut self.options[0],
            Field::B => &mut self.options[1],
            Field::C => &mut self.options[2],
            Field::D => &mut self.options[3],
        }
    }

    /// Replace a field's value outright. Answers are normalized.
    pub fn set(&mut self, field: Field, value: &str) {
        let value = if field == Field::T {
            normalize_answer(value)
        } else {
            value.trim().to_string()
        };
        *self.slot_mut(field) = value;
    }

    /// Accumulate text into a field: blank text is a no-op, otherwise the
    /// text is joined to existing content with a single space. Answer
    /// fragments are normalized and joined without a separator.
    pub fn append(&mut self, field: Field, text: &str) {
        if field == Field::T {
            let letters = normalize_answer(text);
            self.correct_answer.push_str(&letters);
            return;
        }
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let slot = self.slot_mut(field);
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(text);
    }

    /// Row cells in `COLUMNS` order.
    pub fn to_row(&self) -> [&str; 9] {
        FIELDS.map(|f| self.get(f))
    }
}

/// Reduce answer text to the option letters it names, uppercased and in
/// order. Separators, brackets and labels are dropped: `"a, c"` -> `"AC"`,
/// `"答案：B"` -> `"B"`.
pub fn normalize_answer(raw: &str) -> String {
    raw.chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| OPTION_LETTERS.contains(c))
        .collect()
}
