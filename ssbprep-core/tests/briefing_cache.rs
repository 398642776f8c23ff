//! Daily briefing: cache hit, cache-write threshold, placeholder filtering, fallback.

mod common;

use chrono::NaiveDate;
use common::{briefing_text, Reply, ScriptedGateway};
use ssbprep_core::briefing::{self, BriefingSource, CATEGORY};
use ssbprep_core::db;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 14).unwrap()
}

#[tokio::test]
async fn fresh_briefing_is_cached_and_reused() {
    let (conn, _dir) = common::temp_db().await;
    let gateway = ScriptedGateway::new(vec![Reply::Text(briefing_text(4))]);

    let first = briefing::load_daily_briefing(gateway.as_ref(), &conn, day()).await;
    assert_eq!(first.source, BriefingSource::Generated { cached: true });
    assert_eq!(first.items.len(), 4);
    assert_eq!(first.date_key, "2026-05-14");

    let second = briefing::load_daily_briefing(gateway.as_ref(), &conn, day()).await;
    assert_eq!(second.source, BriefingSource::Cache);
    assert_eq!(second.items, first.items);
    assert_eq!(gateway.calls(), 1, "cache hit must not call the provider");
}

#[tokio::test]
async fn thin_answer_is_shown_but_not_cached() {
    let (conn, _dir) = common::temp_db().await;
    let gateway = ScriptedGateway::new(vec![
        Reply::Text(briefing_text(2)),
        Reply::Text(briefing_text(3)),
    ]);

    let first = briefing::load_daily_briefing(gateway.as_ref(), &conn, day()).await;
    assert_eq!(first.source, BriefingSource::Generated { cached: false });
    assert_eq!(first.items.len(), 2);
    assert_eq!(db::cache_get(&conn, CATEGORY, "2026-05-14").await.unwrap(), None);

    let second = briefing::load_daily_briefing(gateway.as_ref(), &conn, day()).await;
    assert_eq!(second.source, BriefingSource::Generated { cached: true });
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn placeholder_items_do_not_count_towards_cache_threshold() {
    let (conn, _dir) = common::temp_db().await;
    let text = format!(
        "{}---\nTITLE: Filler\nCATEGORY: Misc\nSUMMARY: Placeholder text for this news item.\n",
        briefing_text(2)
    );
    let gateway = ScriptedGateway::new(vec![Reply::Text(text)]);

    let b = briefing::load_daily_briefing(gateway.as_ref(), &conn, day()).await;
    assert_eq!(b.items.len(), 2);
    assert!(b.items.iter().all(|i| i.title != "Filler"));
    assert_eq!(b.source, BriefingSource::Generated { cached: false });
}

#[tokio::test]
async fn provider_failure_falls_back_without_caching() {
    let (conn, _dir) = common::temp_db().await;
    let gateway = ScriptedGateway::new(vec![Reply::Fail, Reply::Text("nothing useful".into())]);

    let failed = briefing::load_daily_briefing(gateway.as_ref(), &conn, day()).await;
    assert!(failed.is_fallback());
    assert!(!failed.items.is_empty());

    let unparseable = briefing::load_daily_briefing(gateway.as_ref(), &conn, day()).await;
    assert!(unparseable.is_fallback());
    assert_eq!(db::cache_get(&conn, CATEGORY, "2026-05-14").await.unwrap(), None);
}

#[tokio::test]
async fn corrupt_cache_entry_is_regenerated() {
    let (conn, _dir) = common::temp_db().await;
    db::cache_put(&conn, CATEGORY, "2026-05-14", "not json").await.unwrap();
    let gateway = ScriptedGateway::new(vec![Reply::Text(briefing_text(3))]);

    let b = briefing::load_daily_briefing(gateway.as_ref(), &conn, day()).await;
    assert_eq!(b.source, BriefingSource::Generated { cached: true });
    assert_eq!(gateway.calls(), 1);
}
