//! Background jobs: fallbacks, file-backed transcription and speech output.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::{Reply, ScriptedGateway};
use serde_json::json;
use ssbprep_core::briefing::BriefingSource;
use ssbprep_core::jobs::{run_job, Job, JobContext, JobOutput, TranscriptionSource};
use ssbprep_core::oir::{OirSet, QUESTIONS_PER_SET};

async fn context(replies: Vec<Reply>) -> (JobContext, Arc<ScriptedGateway>, std::path::PathBuf) {
    let (conn, dir) = common::temp_db().await;
    let gateway = ScriptedGateway::new(replies);
    let ctx = JobContext {
        gateway: gateway.clone(),
        conn,
        audio_dir: dir.join("audio"),
    };
    (ctx, gateway, dir)
}

#[tokio::test]
async fn catalog_job_lists_seeded_content() {
    let (ctx, gateway, _dir) = context(vec![]).await;
    let Ok(JobOutput::Catalog { scenarios, topics }) = run_job(&ctx, Job::LoadCatalog).await else {
        panic!("catalog job failed");
    };
    assert!(!scenarios.is_empty());
    assert!(!topics.is_empty());
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn oir_job_falls_back_to_builtin_bank() {
    let (ctx, _gateway, _dir) = context(vec![Reply::Fail]).await;
    let out = run_job(&ctx, Job::OirQuestions { set: OirSet::Verbal }).await.unwrap();
    let JobOutput::OirQuestions { questions, fallback, .. } = out else {
        panic!("unexpected output");
    };
    assert!(fallback);
    assert_eq!(questions.len(), QUESTIONS_PER_SET);
}

#[tokio::test]
async fn oir_job_drops_ill_formed_questions() {
    let reply = json!({
        "questions": [
            { "prompt": "2 + 2?", "options": ["3", "4", "5", "6"], "answer": 1 },
            { "prompt": "Bad index", "options": ["a", "b"], "answer": 7 }
        ]
    });
    let (ctx, _gateway, _dir) = context(vec![Reply::Json(reply)]).await;
    let out = run_job(&ctx, Job::OirQuestions { set: OirSet::NonVerbal }).await.unwrap();
    let JobOutput::OirQuestions { questions, fallback, set } = out else {
        panic!("unexpected output");
    };
    assert_eq!(set, OirSet::NonVerbal);
    assert!(!fallback);
    assert_eq!(questions.len(), 1);
}

#[tokio::test]
async fn briefing_job_never_errors() {
    let (ctx, _gateway, _dir) = context(vec![Reply::Fail]).await;
    let date = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
    let Ok(JobOutput::Briefing(b)) = run_job(&ctx, Job::DailyBriefing { date }).await else {
        panic!("briefing job must resolve");
    };
    assert_eq!(b.source, BriefingSource::Fallback);
}

#[tokio::test]
async fn transcription_reads_the_file() {
    let (ctx, gateway, dir) = context(vec![Reply::Text("  Hello board.  ".into())]).await;
    let path = dir.join("answer.wav");
    std::fs::write(&path, b"RIFF....WAVE").unwrap();

    let out = run_job(
        &ctx,
        Job::Transcribe {
            path,
            source: TranscriptionSource::Audio,
        },
    )
    .await
    .unwrap();
    assert!(matches!(out, JobOutput::Transcript(ref t) if t == "Hello board."));
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn missing_attachment_is_an_error_not_a_call() {
    let (ctx, gateway, dir) = context(vec![]).await;
    let result = run_job(
        &ctx,
        Job::Transcribe {
            path: dir.join("missing.jpg"),
            source: TranscriptionSource::Image,
        },
    )
    .await;
    assert!(result.is_err());
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn speech_is_written_under_audio_dir() {
    let wav = ssbprep_core::wav::pcm16_to_wav(&[0u8; 8], 24_000, 1);
    let (ctx, _gateway, dir) = context(vec![Reply::Audio(wav.clone())]).await;
    let out = run_job(
        &ctx,
        Job::Speak {
            text: "Briefing".into(),
            stem: "gpe/flood village".into(),
        },
    )
    .await
    .unwrap();
    let JobOutput::Speech(path) = out else {
        panic!("unexpected output");
    };
    assert_eq!(path, dir.join("audio").join("gpe_flood_village.wav"));
    assert_eq!(std::fs::read(path).unwrap(), wav);
}
