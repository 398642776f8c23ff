use serde::{Deserialize, Serialize};

/// A GPE scenario from the catalog.
///
/// Read-only to sessions. `image_ref` is an optional pointer to a map or sketch
/// stored alongside the catalog; the terminal UI only shows the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub narrative: String,
    pub difficulty: Difficulty,
    pub image_ref: Option<String>,
}

/// A lecturette topic from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub category: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Parses the lowercase column value; unknown strings map to `Medium`.
    pub fn parse(s: &str) -> Self {
        match s {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

/// Who said a discussion line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Speaker {
    /// The candidate using the app.
    Candidate,
    /// A simulated group member, e.g. "Candidate 3".
    Peer(String),
    /// The Group Testing Officer persona.
    Gto,
}

impl Speaker {
    pub fn label(&self) -> &str {
        match self {
            Speaker::Candidate => "You",
            Speaker::Peer(name) => name,
            Speaker::Gto => "GTO",
        }
    }
}

/// One line in the group discussion, kept in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionPoint {
    pub speaker: Speaker,
    pub text: String,
}

/// Named sub-score, e.g. an OLQ such as "Effective Intelligence".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub name: String,
    pub score: f32,
}

/// Final assessment of a completed session. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// 0–10.
    pub score: f32,
    pub verdict: String,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub sub_scores: Vec<SubScore>,
}

/// Which test produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Gpe,
    Lecturette,
    Screening,
}

impl TestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TestKind::Gpe => "gpe",
            TestKind::Lecturette => "lecturette",
            TestKind::Screening => "screening",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gpe" => Some(TestKind::Gpe),
            "lecturette" => Some(TestKind::Lecturette),
            "screening" => Some(TestKind::Screening),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TestKind::Gpe => "Group Planning Exercise",
            TestKind::Lecturette => "Lecturette",
            TestKind::Screening => "Screening (OIR + PPDT)",
        }
    }
}

/// Lifecycle of a persisted assessment.
///
/// A report is inserted `Pending` before the evaluation call and moved to
/// `Completed` once an evaluation is stored. Failed calls leave it `Pending` so it
/// can be retried later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Completed,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "COMPLETED" {
            ReportStatus::Completed
        } else {
            ReportStatus::Pending
        }
    }
}

/// A row of the `reports` table.
#[derive(Debug, Clone)]
pub struct Report {
    pub id: String,           // UUID v4 text
    pub test_kind: TestKind,
    pub status: ReportStatus,
    pub title: String,
    pub inputs: String,       // JSON of the evaluation request
    pub evaluation: Option<String>, // JSON of the evaluation result
    pub score: Option<f64>,
    pub created_at: i64,      // Unix timestamp seconds
    pub updated_at: i64,
}

/// One current-affairs item in the daily briefing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefingItem {
    pub title: String,
    pub category: String,
    pub summary: String,
    /// Why the item matters for an SSB interview or group discussion.
    #[serde(default)]
    pub relevance: Option<String>,
}

/// A multiple-choice OIR question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OirQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub answer: usize,
}
