//! Background work requested by sessions and screens.
//!
//! Sessions never await anything. An operation returns [`Dispatch`]es (a [`Ticket`]
//! plus a [`Job`]); the app's worker runs each job with [`run_job`] and hands the
//! [`Completion`] back to whoever owns the ticket's session. Owners compare the ticket
//! with what they still expect and drop anything stale.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio_rusqlite::Connection;

use crate::briefing::{self, Briefing};
use crate::content;
use crate::db;
use crate::error::{CoreError, CoreResult};
use crate::evaluation::{self, EvaluationRequest, Settled};
use crate::gateway::{log_failure, AiGateway, Attachment};
use crate::oir::{self, OirSet};
use crate::types::{DiscussionPoint, OirQuestion, Report, Scenario, Topic};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Identity of one session lifetime. A restart gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next() -> Self {
        Self(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Names one outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub session: SessionId,
    pub seq: u64,
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.session, self.seq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionSource {
    /// Recorded speech.
    Audio,
    /// Photographed handwriting.
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    LoadCatalog,
    DailyBriefing { date: NaiveDate },
    DiscussionPoints { scenario: Scenario, individual_solution: String },
    LecturetteOutline { topic: Topic },
    OirQuestions { set: OirSet },
    PpdtPicture { seed: u64 },
    Transcribe { path: PathBuf, source: TranscriptionSource },
    Speak { text: String, stem: String },
    Evaluate(EvaluationRequest),
    RetryReport { report_id: String },
    ListReports { limit: usize },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::LoadCatalog => "load-catalog",
            Job::DailyBriefing { .. } => "daily-briefing",
            Job::DiscussionPoints { .. } => "discussion-points",
            Job::LecturetteOutline { .. } => "lecturette-outline",
            Job::OirQuestions { .. } => "oir-questions",
            Job::PpdtPicture { .. } => "ppdt-picture",
            Job::Transcribe { .. } => "transcribe",
            Job::Speak { .. } => "speak",
            Job::Evaluate(_) => "evaluate",
            Job::RetryReport { .. } => "retry-report",
            Job::ListReports { .. } => "list-reports",
        }
    }
}

#[derive(Debug)]
pub enum JobOutput {
    Catalog { scenarios: Vec<Scenario>, topics: Vec<Topic> },
    Briefing(Briefing),
    DiscussionPoints(Vec<DiscussionPoint>),
    Outline(String),
    OirQuestions { set: OirSet, questions: Vec<OirQuestion>, fallback: bool },
    PpdtPicture { description: String, fallback: bool },
    Transcript(String),
    Speech(PathBuf),
    Evaluation(Settled),
    Reports(Vec<Report>),
}

impl JobOutput {
    pub fn name(&self) -> &'static str {
        match self {
            JobOutput::Catalog { .. } => "catalog",
            JobOutput::Briefing(_) => "briefing",
            JobOutput::DiscussionPoints(_) => "discussion-points",
            JobOutput::Outline(_) => "outline",
            JobOutput::OirQuestions { .. } => "oir-questions",
            JobOutput::PpdtPicture { .. } => "ppdt-picture",
            JobOutput::Transcript(_) => "transcript",
            JobOutput::Speech(_) => "speech",
            JobOutput::Evaluation(_) => "evaluation",
            JobOutput::Reports(_) => "reports",
        }
    }
}

pub type JobResult = Result<JobOutput, CoreError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub job: Job,
}

#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub result: JobResult,
}

/// Shared handles every job may need.
#[derive(Clone)]
pub struct JobContext {
    pub gateway: Arc<dyn AiGateway>,
    pub conn: Connection,
    pub audio_dir: PathBuf,
}

/// Runs one job to completion.
///
/// Jobs with a built-in fallback (briefing, OIR questions, PPDT picture) resolve to
/// `Ok` with a fallback flag instead of an error.
pub async fn run_job(ctx: &JobContext, job: Job) -> JobResult {
    let gateway = ctx.gateway.as_ref();
    match job {
        Job::LoadCatalog => Ok(JobOutput::Catalog {
            scenarios: db::list_scenarios(&ctx.conn).await?,
            topics: db::list_topics(&ctx.conn).await?,
        }),
        Job::DailyBriefing { date } => Ok(JobOutput::Briefing(
            briefing::load_daily_briefing(gateway, &ctx.conn, date).await,
        )),
        Job::DiscussionPoints {
            scenario,
            individual_solution,
        } => {
            let points =
                content::discussion_points(gateway, &scenario, &individual_solution).await?;
            Ok(JobOutput::DiscussionPoints(points))
        }
        Job::LecturetteOutline { topic } => {
            Ok(JobOutput::Outline(content::lecturette_outline(gateway, &topic).await?))
        }
        Job::OirQuestions { set } => Ok(match oir::generate_set(gateway, set).await {
            Ok(questions) => JobOutput::OirQuestions {
                set,
                questions,
                fallback: false,
            },
            Err(e) => {
                log_failure("oir questions", &e);
                JobOutput::OirQuestions {
                    set,
                    questions: oir::fallback_set(set),
                    fallback: true,
                }
            }
        }),
        Job::PpdtPicture { seed } => {
            let (description, fallback) = content::ppdt_picture(gateway, seed).await;
            Ok(JobOutput::PpdtPicture {
                description,
                fallback,
            })
        }
        Job::Transcribe { path, source } => Ok(JobOutput::Transcript(
            transcribe(gateway, &path, source).await?,
        )),
        Job::Speak { text, stem } => Ok(JobOutput::Speech(
            content::speak_to_file(gateway, &text, &ctx.audio_dir, &stem).await?,
        )),
        Job::Evaluate(request) => Ok(JobOutput::Evaluation(
            evaluation::evaluate_and_persist(gateway, &ctx.conn, &request).await?,
        )),
        Job::RetryReport { report_id } => Ok(JobOutput::Evaluation(
            evaluation::retry_report(gateway, &ctx.conn, &report_id).await?,
        )),
        Job::ListReports { limit } => Ok(JobOutput::Reports(
            db::list_reports(&ctx.conn, limit).await?,
        )),
    }
}

async fn transcribe(
    gateway: &dyn AiGateway,
    path: &std::path::Path,
    source: TranscriptionSource,
) -> CoreResult<String> {
    let attachment = Attachment::from_path(path).await?;
    let text = match source {
        TranscriptionSource::Audio => gateway.transcribe_audio(&attachment).await,
        TranscriptionSource::Image => gateway.transcribe_image(&attachment).await,
    };
    text.map_err(|e| {
        log_failure("transcription", &e);
        CoreError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
        let t = Ticket { session: a, seq: 3 };
        assert!(t.to_string().ends_with("#3"));
    }
}
