//! Prediction ledger integration tests

use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use sports_edge::data::{LedgerParquetReader, LedgerParquetWriter};
use sports_edge::edge::EdgeClassifier;
use sports_edge::ledger::{
    load_entries, save_entries, InMemoryLedger, LedgerError, LedgerQuery, LedgerStore,
    OddsSnapshot, PredictionLedger, PredictionOutcome,
};
use sports_edge::market::OddsTriple;
use sports_edge::model::Blender;
use sports_edge::pipeline::Analyzer;
use sports_edge::repair::IntegrityRepair;
use sports_edge::signal::RawMatchInput;
use sports_edge::tracker::{
    OutcomeTracker, PerformanceSummary, ResultReport, ResultStatus, Settlement,
};
use std::sync::Arc;

fn create_test_input(match_id: &str, kickoff: DateTime<Utc>) -> RawMatchInput {
    RawMatchInput {
        match_id: match_id.to_string(),
        sport: "soccer_epl".to_string(),
        home_team: format!("{} Home", match_id),
        away_team: format!("{} Away", match_id),
        kickoff: Some(kickoff),
        home_form: Some("WWWDW".to_string()),
        away_form: Some("LLDLL".to_string()),
        odds: Some(OddsTriple::three_way(dec!(1.80), dec!(3.40), dec!(4.50))),
        ..Default::default()
    }
}

fn create_test_report(match_id: &str, score: &str) -> ResultReport {
    ResultReport {
        match_id: match_id.to_string(),
        status: ResultStatus::Final,
        score: Some(score.to_string()),
        void_reason: None,
        closing_odds: None,
    }
}

#[tokio::test]
async fn test_full_lifecycle() {
    let analyzer = Analyzer::new(Blender::default(), EdgeClassifier::default(), "v1");
    let store = Arc::new(InMemoryLedger::new());
    let ledger = PredictionLedger::new(store.clone(), Duration::minutes(30));
    let tracker = OutcomeTracker::new(store.clone(), Duration::minutes(30));

    let kickoff = Utc::now() + Duration::days(1);
    let predicted_at = Utc::now();

    let analysis = analyzer.analyze(&create_test_input("m-1", kickoff)).unwrap();
    let id = ledger.record_analysis(&analysis, predicted_at).await.unwrap();

    // Re-analysis of a pending prediction keeps its identity
    let again = ledger.record_analysis(&analysis, predicted_at).await.unwrap();
    assert_eq!(id, again);

    ledger
        .attach_odds(
            id,
            &OddsSnapshot {
                odds: OddsTriple::three_way(dec!(1.80), dec!(3.40), dec!(4.50)),
                observed_at: predicted_at,
            },
        )
        .await
        .unwrap();

    let report = ResultReport {
        closing_odds: Some(OddsSnapshot {
            odds: OddsTriple::three_way(dec!(1.65), dec!(3.60), dec!(5.50)),
            observed_at: kickoff - Duration::minutes(5),
        }),
        ..create_test_report("m-1", "2-0")
    };
    let results = tracker.process(&report, kickoff + Duration::hours(2)).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].1, Ok(Settlement::Settled(PredictionOutcome::Hit)));

    let entry = ledger.get(id).await.unwrap();
    assert_eq!(entry.outcome, PredictionOutcome::Hit);
    assert_eq!(entry.opening_odds, Some(dec!(1.80)));
    assert_eq!(entry.closing_odds, Some(dec!(1.65)));
    assert!((entry.clv_value.unwrap() - 5.05).abs() < 0.01);

    // Terminal entries reject every further write
    let err = tracker
        .settle(id, Some("0-2"), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::StateConflict { .. }));
    let err = ledger.record_analysis(&analysis, predicted_at).await.unwrap_err();
    assert!(matches!(err, LedgerError::StateConflict { .. }));
    assert_eq!(ledger.get(id).await.unwrap().outcome, PredictionOutcome::Hit);
}

#[tokio::test]
async fn test_void_is_push_and_clv_stays_null() {
    let analyzer = Analyzer::new(Blender::default(), EdgeClassifier::default(), "v1");
    let store = Arc::new(InMemoryLedger::new());
    let ledger = PredictionLedger::new(store.clone(), Duration::minutes(30));
    let tracker = OutcomeTracker::new(store.clone(), Duration::minutes(30));

    let kickoff = Utc::now() + Duration::days(1);
    let analysis = analyzer.analyze(&create_test_input("m-void", kickoff)).unwrap();
    let id = ledger.record_analysis(&analysis, Utc::now()).await.unwrap();

    let report = ResultReport {
        status: ResultStatus::Void,
        score: None,
        void_reason: Some("postponed".to_string()),
        ..create_test_report("m-void", "")
    };
    tracker.process(&report, Utc::now()).await.unwrap();

    let entry = store.get(id).await.unwrap();
    assert_eq!(entry.outcome, PredictionOutcome::Push);
    assert_eq!(entry.void_reason.as_deref(), Some("postponed"));
    assert!(entry.closing_odds.is_none());
    assert!(entry.clv_value.is_none());
}

#[tokio::test]
async fn test_persist_query_report_and_export() {
    let analyzer = Analyzer::new(Blender::default(), EdgeClassifier::default(), "v1");
    let store = Arc::new(InMemoryLedger::new());
    let ledger = PredictionLedger::new(store.clone(), Duration::minutes(30));
    let tracker = OutcomeTracker::new(store.clone(), Duration::minutes(30));

    let base = Utc::now() + Duration::days(1);
    for (i, score) in ["2-0", "0-1", "1-1"].iter().enumerate() {
        let match_id = format!("m-{}", i);
        let kickoff = base + Duration::hours(i as i64);
        let analysis = analyzer.analyze(&create_test_input(&match_id, kickoff)).unwrap();
        ledger.record_analysis(&analysis, Utc::now()).await.unwrap();
        tracker
            .process(&create_test_report(&match_id, score), kickoff + Duration::hours(2))
            .await
            .unwrap();
    }
    let pending = analyzer
        .analyze(&create_test_input("m-pending", base + Duration::days(3)))
        .unwrap();
    ledger.record_analysis(&pending, Utc::now()).await.unwrap();

    let hits = store
        .query(&LedgerQuery::new().outcome(PredictionOutcome::Hit))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].match_id, "m-0");

    let entries = store.entries().await;
    let summary = PerformanceSummary::from_entries(&entries);
    assert_eq!(summary.total, 4);
    assert_eq!((summary.hits, summary.misses, summary.pending), (1, 2, 1));

    // JSON persistence
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    save_entries(&path, &entries).unwrap();
    let reloaded = InMemoryLedger::from_entries(load_entries(&path).unwrap()).unwrap();
    assert_eq!(reloaded.len().await, 4);

    // Repair finds nothing on healthy data
    let report = IntegrityRepair::default()
        .repair_store(&reloaded, None)
        .await
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(report.scanned, 4);

    // Parquet export
    let writer = LedgerParquetWriter::new(dir.path().join("export"));
    let export_path = writer.file_path("ledger", Utc::now());
    writer.write_entries(&export_path, &entries).unwrap();
    let rows = LedgerParquetReader::new(export_path).read().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].match_id, "m-0");
    assert_eq!(rows[0].outcome, "HIT");
    assert_eq!(rows[3].outcome, "PENDING");
}
