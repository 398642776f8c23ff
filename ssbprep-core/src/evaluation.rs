//! Final assessment of a completed session and its persistence as a report.
//!
//! A report row is inserted `PENDING` with the serialized request before the provider
//! is called, then moved to `COMPLETED` once an evaluation is stored. A failed call
//! leaves the row pending; [`retry_report`] re-runs it from the stored inputs.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_rusqlite::Connection;

use crate::db;
use crate::error::{CoreError, CoreResult, GatewayError};
use crate::gateway::{decode, log_failure, AiGateway};
use crate::scoring::{self, ScreeningDecision};
use crate::types::{DiscussionPoint, Evaluation, ReportStatus, TestKind};

/// Story plus narration below this many words never reaches the provider.
pub const PPDT_MIN_WORDS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpeSubmission {
    pub scenario_title: String,
    pub narrative: String,
    pub individual_solution: String,
    pub discussion: Vec<DiscussionPoint>,
    pub final_plan: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LecturetteSubmission {
    pub topic_title: String,
    pub outline: Option<String>,
    pub speech: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningSubmission {
    pub picture: String,
    pub story: String,
    pub narration: String,
    pub oir_verbal_pct: f32,
    pub oir_nonverbal_pct: f32,
}

impl ScreeningSubmission {
    pub fn word_count(&self) -> usize {
        self.story.split_whitespace().count() + self.narration.split_whitespace().count()
    }
}

/// Everything needed to (re-)run an evaluation. Stored as the report's `inputs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationRequest {
    Gpe(GpeSubmission),
    Lecturette(LecturetteSubmission),
    Screening(ScreeningSubmission),
}

impl EvaluationRequest {
    pub fn test_kind(&self) -> TestKind {
        match self {
            EvaluationRequest::Gpe(_) => TestKind::Gpe,
            EvaluationRequest::Lecturette(_) => TestKind::Lecturette,
            EvaluationRequest::Screening(_) => TestKind::Screening,
        }
    }

    pub fn title(&self) -> String {
        match self {
            EvaluationRequest::Gpe(s) => format!("GPE: {}", s.scenario_title),
            EvaluationRequest::Lecturette(s) => format!("Lecturette: {}", s.topic_title),
            EvaluationRequest::Screening(_) => "Screening: OIR + PPDT".to_owned(),
        }
    }
}

/// What gets stored in the report's `evaluation` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub evaluation: Evaluation,
    #[serde(default)]
    pub screening: Option<ScreeningDecision>,
}

impl AssessmentResult {
    /// Headline number for the report list: the weighted score for screening runs.
    pub fn headline_score(&self) -> f32 {
        self.screening
            .as_ref()
            .map_or(self.evaluation.score, |d| d.final_score)
    }
}

/// How an evaluation attempt ended.
#[derive(Debug)]
pub enum Settled {
    Completed {
        report_id: String,
        result: AssessmentResult,
    },
    /// The report stays `PENDING` and can be retried.
    Pending {
        report_id: String,
        error: GatewayError,
    },
}

impl Settled {
    pub fn report_id(&self) -> &str {
        match self {
            Settled::Completed { report_id, .. } | Settled::Pending { report_id, .. } => report_id,
        }
    }
}

/// Response schema shared by every evaluation prompt.
pub fn evaluation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "NUMBER" },
            "verdict": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "strengths": { "type": "ARRAY", "items": { "type": "STRING" } },
            "improvements": { "type": "ARRAY", "items": { "type": "STRING" } },
            "sub_scores": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "score": { "type": "NUMBER" }
                    },
                    "required": ["name", "score"]
                }
            }
        },
        "required": ["score", "verdict", "summary"]
    })
}

const ASSESSOR: &str = "You are an experienced SSB assessor. Assess the candidate's Officer \
    Like Qualities. Score 0-10 overall, give a one-line verdict, a short summary, strengths, \
    improvements, and sub_scores (0-10) for the most relevant OLQs.";

fn prompt_for(request: &EvaluationRequest) -> String {
    match request {
        EvaluationRequest::Gpe(s) => {
            let discussion: String = s
                .discussion
                .iter()
                .map(|p| format!("- {}: {}\n", p.speaker.label(), p.text))
                .collect();
            format!(
                "{ASSESSOR}\n\nTest: Group Planning Exercise\nScenario: {}\n{}\n\n\
                 Individual solution:\n{}\n\nGroup discussion:\n{}\nFinal group plan:\n{}",
                s.scenario_title, s.narrative, s.individual_solution, discussion, s.final_plan
            )
        }
        EvaluationRequest::Lecturette(s) => format!(
            "{ASSESSOR}\n\nTest: Lecturette (3 minute talk)\nTopic: {}\nPrepared outline:\n{}\n\n\
             Delivered talk (transcript):\n{}",
            s.topic_title,
            s.outline.as_deref().unwrap_or("(none)"),
            s.speech
        ),
        EvaluationRequest::Screening(s) => format!(
            "{ASSESSOR}\n\nTest: Picture Perception and Description Test\nPicture:\n{}\n\n\
             Written story:\n{}\n\nOral narration (transcript):\n{}",
            s.picture, s.story, s.narration
        ),
    }
}

/// Fixed result for a PPDT attempt with too little material to assess.
pub fn insufficient_data() -> Evaluation {
    Evaluation {
        score: 0.0,
        verdict: "Insufficient data".into(),
        summary: format!(
            "The story and narration together have fewer than {PPDT_MIN_WORDS} words, which \
             is not enough to assess perception or expression."
        ),
        strengths: Vec::new(),
        improvements: vec![
            "Write a complete story with a clear hero, action and outcome.".into(),
            "Narrate for the full minute.".into(),
        ],
        sub_scores: Vec::new(),
    }
}

fn normalize(mut evaluation: Evaluation) -> Evaluation {
    evaluation.score = clamp_score(evaluation.score);
    for sub in &mut evaluation.sub_scores {
        sub.score = clamp_score(sub.score);
    }
    evaluation
}

fn clamp_score(score: f32) -> f32 {
    if score.is_finite() {
        score.clamp(0.0, 10.0)
    } else {
        0.0
    }
}

/// Runs the provider evaluation for `request` without touching storage.
///
/// # Errors
///
/// Gateway failures, including [`GatewayError::Malformed`] for unusable JSON.
pub async fn assess(
    gateway: &dyn AiGateway,
    request: &EvaluationRequest,
) -> Result<AssessmentResult, GatewayError> {
    if let EvaluationRequest::Screening(s) = request {
        let evaluation = if s.word_count() < PPDT_MIN_WORDS {
            tracing::info!(words = s.word_count(), "PPDT below word floor; skipping AI call");
            insufficient_data()
        } else {
            ask(gateway, request).await?
        };
        let decision = scoring::decide(s.oir_verbal_pct, s.oir_nonverbal_pct, evaluation.score);
        return Ok(AssessmentResult {
            evaluation,
            screening: Some(decision),
        });
    }
    Ok(AssessmentResult {
        evaluation: ask(gateway, request).await?,
        screening: None,
    })
}

async fn ask(
    gateway: &dyn AiGateway,
    request: &EvaluationRequest,
) -> Result<Evaluation, GatewayError> {
    let value = gateway
        .generate_json(&prompt_for(request), &evaluation_schema())
        .await?;
    decode::<Evaluation>(value).map(normalize)
}

/// Inserts a `PENDING` report, evaluates, and completes the report on success.
///
/// # Errors
///
/// Only storage and serialization failures. A provider failure is reported as
/// [`Settled::Pending`].
pub async fn evaluate_and_persist(
    gateway: &dyn AiGateway,
    conn: &Connection,
    request: &EvaluationRequest,
) -> CoreResult<Settled> {
    let inputs = serde_json::to_string(request)?;
    let report = db::insert_report(conn, request.test_kind(), &request.title(), &inputs).await?;
    tracing::info!(report_id = %report.id, kind = report.test_kind.as_str(), "report created");
    run(gateway, conn, report.id, request).await
}

/// Re-runs the evaluation of a stored report.
///
/// A report that is already `COMPLETED` is returned as-is without calling the
/// provider.
///
/// # Errors
///
/// [`CoreError::NotFound`] for an unknown id; storage and serialization failures.
pub async fn retry_report(
    gateway: &dyn AiGateway,
    conn: &Connection,
    report_id: &str,
) -> CoreResult<Settled> {
    let report = db::load_report(conn, report_id)
        .await?
        .ok_or_else(|| CoreError::not_found("report", report_id))?;

    if report.status == ReportStatus::Completed {
        if let Some(stored) = report.evaluation.as_deref() {
            let result: AssessmentResult = serde_json::from_str(stored)?;
            return Ok(Settled::Completed {
                report_id: report.id,
                result,
            });
        }
    }

    let request: EvaluationRequest = serde_json::from_str(&report.inputs)?;
    tracing::info!(report_id = %report.id, "retrying pending report");
    run(gateway, conn, report.id, &request).await
}

async fn run(
    gateway: &dyn AiGateway,
    conn: &Connection,
    report_id: String,
    request: &EvaluationRequest,
) -> CoreResult<Settled> {
    match assess(gateway, request).await {
        Ok(result) => {
            let json = serde_json::to_string(&result)?;
            let score = f64::from(result.headline_score());
            if !db::complete_report(conn, &report_id, &json, score).await? {
                return Err(CoreError::not_found("report", report_id));
            }
            tracing::info!(report_id = %report_id, score, "report completed");
            Ok(Settled::Completed { report_id, result })
        }
        Err(error) => {
            log_failure("evaluation", &error);
            Ok(Settled::Pending { report_id, error })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Speaker, SubScore};

    #[test]
    fn request_round_trips_through_inputs_column() {
        let req = EvaluationRequest::Gpe(GpeSubmission {
            scenario_title: "Flood".into(),
            narrative: "Water rising".into(),
            individual_solution: "Evacuate school".into(),
            discussion: vec![DiscussionPoint {
                speaker: Speaker::Peer("Candidate 2".into()),
                text: "Bridge first".into(),
            }],
            final_plan: "Split into two teams".into(),
        });
        let raw = serde_json::to_string(&req).unwrap();
        assert!(raw.contains("\"kind\":\"gpe\""));
        let back: EvaluationRequest = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, req);
        assert_eq!(back.test_kind(), TestKind::Gpe);
    }

    #[test]
    fn scores_are_clamped() {
        let e = normalize(Evaluation {
            score: 14.0,
            verdict: String::new(),
            summary: String::new(),
            strengths: vec![],
            improvements: vec![],
            sub_scores: vec![SubScore {
                name: "Initiative".into(),
                score: -3.0,
            }],
        });
        assert_eq!(e.score, 10.0);
        assert_eq!(e.sub_scores[0].score, 0.0);
    }

    #[test]
    fn word_count_spans_story_and_narration() {
        let s = ScreeningSubmission {
            picture: String::new(),
            story: "one two three".into(),
            narration: "  four\nfive ".into(),
            oir_verbal_pct: 0.0,
            oir_nonverbal_pct: 0.0,
        };
        assert_eq!(s.word_count(), 5);
    }
}
