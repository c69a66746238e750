//! Benchmarks for the per-match analysis path

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sports_edge::edge::EdgeClassifier;
use sports_edge::market::{devig, OddsTriple};
use sports_edge::model::Blender;
use sports_edge::pipeline::Analyzer;
use sports_edge::signal::{RawMatchInput, RawTeamStats};
use rust_decimal_macros::dec;

fn create_bench_input(match_id: usize) -> RawMatchInput {
    RawMatchInput {
        match_id: format!("m-{}", match_id),
        sport: "soccer_epl".to_string(),
        home_team: format!("Home {}", match_id),
        away_team: format!("Away {}", match_id),
        kickoff: chrono::DateTime::from_timestamp(1_793_545_200, 0),
        home_stats: Some(RawTeamStats {
            scored: Some(30.0),
            conceded: Some(18.0),
            played: Some(15),
        }),
        away_stats: Some(RawTeamStats {
            scored: Some(22.0),
            conceded: Some(20.0),
            played: Some(15),
        }),
        home_form: Some("WWDLW".to_string()),
        away_form: Some("LDLWL".to_string()),
        home_rest_days: Some(6),
        away_rest_days: Some(3),
        away_travel_km: Some(420.0),
        odds: Some(OddsTriple::three_way(dec!(1.80), dec!(3.40), dec!(4.50))),
        ..Default::default()
    }
}

fn benchmark_devig(c: &mut Criterion) {
    let odds = OddsTriple::three_way(dec!(1.80), dec!(3.40), dec!(4.50));

    c.bench_function("devig_three_way", |b| b.iter(|| devig(black_box(&odds))));
}

fn benchmark_analyze(c: &mut Criterion) {
    let analyzer = Analyzer::new(Blender::default(), EdgeClassifier::default(), "v1");
    let input = create_bench_input(0);

    c.bench_function("analyze_match", |b| {
        b.iter(|| analyzer.analyze(black_box(&input)))
    });
}

fn benchmark_analyze_batch(c: &mut Criterion) {
    let analyzer = Analyzer::new(Blender::default(), EdgeClassifier::default(), "v1");
    let inputs: Vec<RawMatchInput> = (0..256).map(create_bench_input).collect();

    c.bench_function("analyze_batch_256", |b| {
        b.iter(|| analyzer.analyze_batch(black_box(&inputs)))
    });
}

criterion_group!(
    benches,
    benchmark_devig,
    benchmark_analyze,
    benchmark_analyze_batch
);
criterion_main!(benches);
