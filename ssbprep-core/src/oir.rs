//! Officer Intelligence Rating question sets.
//!
//! Sets are generated as structured JSON; a built-in bank stands in when the provider
//! is unavailable or its answer does not validate.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::gateway::{decode, AiGateway};
use crate::types::OirQuestion;

pub const QUESTIONS_PER_SET: usize = 10;
/// Answer keys run 1 to this number, so longer option lists are rejected.
pub const MAX_OPTIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OirSet {
    Verbal,
    NonVerbal,
}

impl OirSet {
    pub fn label(self) -> &'static str {
        match self {
            OirSet::Verbal => "Verbal reasoning",
            OirSet::NonVerbal => "Non-verbal reasoning",
        }
    }
}

fn question_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "questions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "prompt": { "type": "STRING" },
                        "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "answer": { "type": "INTEGER" }
                    },
                    "required": ["prompt", "options", "answer"]
                }
            }
        },
        "required": ["questions"]
    })
}

fn set_prompt(set: OirSet, count: usize) -> String {
    let style = match set {
        OirSet::Verbal => {
            "verbal reasoning: analogies, coding-decoding, odd one out, blood relations \
             and number or letter series"
        }
        OirSet::NonVerbal => {
            "non-verbal reasoning expressed in text: figure series described in words, \
             mirror and water images of letter groups, pattern completion and counting \
             shapes in a described figure"
        }
    };
    format!(
        "Generate {count} multiple-choice questions for an SSB Officer Intelligence Rating \
         test, {style}. Each question has exactly {MAX_OPTIONS} options and `answer` is the \
         zero-based index of the correct option."
    )
}

#[derive(Deserialize)]
struct QuestionSet {
    questions: Vec<OirQuestion>,
}

fn is_well_formed(q: &OirQuestion) -> bool {
    !q.prompt.trim().is_empty()
        && (2..=MAX_OPTIONS).contains(&q.options.len())
        && q.answer < q.options.len()
}

/// Requests one question set from the provider.
///
/// Ill-formed questions are dropped.
///
/// # Errors
///
/// Gateway failures pass through. [`GatewayError::Malformed`] when no question survives.
pub async fn generate_set(
    gateway: &dyn AiGateway,
    set: OirSet,
) -> Result<Vec<OirQuestion>, GatewayError> {
    let value = gateway
        .generate_json(&set_prompt(set, QUESTIONS_PER_SET), &question_schema())
        .await?;
    let raw = value.to_string();
    let parsed: QuestionSet = decode(value)?;
    let questions: Vec<OirQuestion> = parsed
        .questions
        .into_iter()
        .filter(is_well_formed)
        .take(QUESTIONS_PER_SET)
        .collect();
    if questions.is_empty() {
        return Err(GatewayError::malformed("no well-formed OIR questions", raw));
    }
    Ok(questions)
}

fn q(prompt: &str, options: [&str; 4], answer: usize) -> OirQuestion {
    OirQuestion {
        prompt: prompt.to_owned(),
        options: options.iter().map(|o| (*o).to_owned()).collect(),
        answer,
    }
}

/// Built-in questions for `set`.
pub fn fallback_set(set: OirSet) -> Vec<OirQuestion> {
    match set {
        OirSet::Verbal => vec![
            q("Find the next number: 2, 6, 12, 20, 30, ?", ["40", "42", "44", "36"], 1),
            q(
                "BOOK is to LIBRARY as PAINTING is to ?",
                ["Artist", "Canvas", "Gallery", "Frame"],
                2,
            ),
            q("Find the odd one out.", ["Tank", "Frigate", "Destroyer", "Corvette"], 0),
            q("If ARMY is coded as BSNZ, how is NAVY coded?", ["OBWZ", "OBXZ", "MBWZ", "OCWZ"], 0),
            q(
                "Pointing to a man, Ravi says \"His mother is my mother's only daughter.\" \
                 The man is Ravi's?",
                ["Brother", "Nephew", "Son", "Cousin"],
                1,
            ),
            q("Find the next letter group: AZ, BY, CX, ?", ["DV", "DW", "EW", "DX"], 1),
            q("Which word cannot be formed from CAPTAIN?", ["PAINT", "PACT", "CHAIN", "TAPIN"], 2),
            q(
                "Choose the word most similar to VALOUR.",
                ["Fear", "Courage", "Wisdom", "Honour"],
                1,
            ),
            q("Find the missing number: 3, 9, 27, ?, 243", ["54", "72", "81", "90"], 2),
            q("Soldier : Regiment :: Sailor : ?", ["Ship", "Crew", "Fleet", "Navy"], 1),
        ],
        OirSet::NonVerbal => vec![
            q(
                "A square rotates 45° clockwise at each step. After 6 steps it has turned \
                 through?",
                ["180°", "270°", "225°", "315°"],
                1,
            ),
            q(
                "Which capital letter looks unchanged in a vertical mirror?",
                ["A", "B", "C", "F"],
                0,
            ),
            q(
                "A figure series adds one side each step: triangle, square, pentagon, ?",
                ["Hexagon", "Circle", "Octagon", "Square"],
                0,
            ),
            q(
                "How many triangles are in a square divided by both diagonals?",
                ["4", "6", "8", "2"],
                2,
            ),
            q(
                "Dots increase 1, 3, 6, 10. The next figure has how many dots?",
                ["14", "15", "16", "13"],
                1,
            ),
            q(
                "An arrow points North and turns 90° anticlockwise twice. It now points?",
                ["East", "West", "South", "North"],
                2,
            ),
            q("Water image of the letter 'M' looks like?", ["W", "M", "N", "V"], 0),
            q(
                "A cube painted on all faces is cut into 27 equal cubes. How many have no paint?",
                ["0", "1", "6", "8"],
                1,
            ),
            q(
                "Shading moves one quadrant clockwise each step, starting top-left. After 3 \
                 steps it is?",
                ["Top-right", "Bottom-right", "Bottom-left", "Top-left"],
                2,
            ),
            q(
                "Which completes the pattern: circle-in-square, square-in-circle, \
                 circle-in-square, ?",
                ["Square-in-circle", "Circle-in-circle", "Square-in-square", "Triangle-in-circle"],
                0,
            ),
        ],
    }
}

/// A question set being answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OirSheet {
    pub set: OirSet,
    pub questions: Vec<OirQuestion>,
    answers: Vec<Option<usize>>,
    cursor: usize,
    /// True when the questions came from the built-in bank.
    pub fallback: bool,
}

impl OirSheet {
    pub fn new(set: OirSet, questions: Vec<OirQuestion>, fallback: bool) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            set,
            questions,
            answers,
            cursor: 0,
            fallback,
        }
    }

    pub fn fallback(set: OirSet) -> Self {
        Self::new(set, fallback_set(set), true)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&OirQuestion> {
        self.questions.get(self.cursor)
    }

    pub fn answer_for(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten()
    }

    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// Records `option` for the current question. Returns `false` and records nothing
    /// when the question has no such option.
    pub fn choose(&mut self, option: usize) -> bool {
        let Some(q) = self.questions.get(self.cursor) else {
            return false;
        };
        if option >= q.options.len() {
            return false;
        }
        self.answers[self.cursor] = Some(option);
        true
    }

    pub fn next(&mut self) {
        if self.cursor + 1 < self.questions.len() {
            self.cursor += 1;
        }
    }

    pub fn prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Share of correct answers, 0–100. Unanswered questions count as wrong.
    pub fn percentage(&self) -> f32 {
        if self.questions.is_empty() {
            return 0.0;
        }
        let correct = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| **a == Some(q.answer))
            .count();
        correct as f32 * 100.0 / self.questions.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_bank_is_well_formed() {
        for set in [OirSet::Verbal, OirSet::NonVerbal] {
            let bank = fallback_set(set);
            assert_eq!(bank.len(), QUESTIONS_PER_SET);
            assert!(bank.iter().all(is_well_formed));
        }
    }

    #[test]
    fn percentage_counts_unanswered_as_wrong() {
        let mut sheet = OirSheet::fallback(OirSet::Verbal);
        let correct: Vec<usize> = sheet.questions.iter().map(|q| q.answer).collect();
        for (i, answer) in correct.iter().enumerate().take(4) {
            assert_eq!(sheet.cursor(), i);
            sheet.choose(*answer);
            sheet.next();
        }
        sheet.choose((correct[4] + 1) % 4);
        assert_eq!(sheet.answered(), 5);
        assert!((sheet.percentage() - 40.0).abs() < 1e-4);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut sheet = OirSheet::fallback(OirSet::NonVerbal);
        sheet.prev();
        assert_eq!(sheet.cursor(), 0);
        for _ in 0..50 {
            sheet.next();
        }
        assert_eq!(sheet.cursor(), QUESTIONS_PER_SET - 1);
        sheet.choose(99);
        assert_eq!(sheet.answer_for(QUESTIONS_PER_SET - 1), None);
    }

    #[test]
    fn empty_sheet_scores_zero() {
        assert_eq!(OirSheet::new(OirSet::Verbal, vec![], false).percentage(), 0.0);
    }

    #[test]
    fn option_count_must_fit_the_answer_keys() {
        let with = |n: usize| OirQuestion {
            prompt: "Pick one".into(),
            options: (1..=n).map(|i| i.to_string()).collect(),
            answer: 0,
        };
        assert!(!is_well_formed(&with(1)));
        assert!(is_well_formed(&with(2)));
        assert!(is_well_formed(&with(MAX_OPTIONS)));
        assert!(!is_well_formed(&with(MAX_OPTIONS + 1)));
    }

    #[test]
    fn choosing_a_missing_option_records_nothing() {
        let mut sheet = OirSheet::fallback(OirSet::NonVerbal);
        assert!(!sheet.choose(MAX_OPTIONS));
        assert_eq!(sheet.answer_for(0), None);
        assert!(sheet.choose(0));
        assert_eq!(sheet.answer_for(0), Some(0));
    }
}
