use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cntryl_measure::{
    rank_stats, Decorations, EntryKind, Experiment, Precision, RankingCriteria, Report,
    SamplingConfig, Stat, StatsKind, Style,
};

#[test]
fn should_summarize_recorded_values() {
    let e = Experiment::new("sizes");
    for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
        e.record_value("payload", v, Decorations::new().units("KB"));
    }

    let stats = e.get_stats("payload");
    assert_eq!(stats.kind, StatsKind::Value);
    assert_eq!(stats.n, 8);
    assert_eq!(stats.value_for(Stat::Min), 2.0);
    assert_eq!(stats.value_for(Stat::Max), 9.0);
    assert_eq!(stats.value_for(Stat::Mean), 5.0);
    assert_eq!(stats.value_for(Stat::StdDev), 2.0);
    assert_eq!(stats.value_for(Stat::Median), 4.5);
}

#[test]
fn should_sample_values_in_parallel() {
    let e = Experiment::new("parallel");
    let calls = AtomicUsize::new(0);

    e.sample_value(
        "idx",
        |idx| {
            calls.fetch_add(1, Ordering::SeqCst);
            idx as f64
        },
        &SamplingConfig::new().n(50).num_parallel(4),
        Decorations::new(),
    );

    let entry = e.get("idx");
    assert_eq!(calls.load(Ordering::SeqCst), 50);
    assert_eq!(entry.kind, EntryKind::Value);
    assert_eq!(entry.values.len(), 50);
    assert_eq!(entry.annotations.len(), 50);

    let mut seen: Vec<usize> = entry.values.iter().map(|v| *v as usize).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..50).collect::<Vec<_>>());
}

#[test]
fn should_stop_sampling_at_duration_limit() {
    let e = Experiment::new("bounded");
    let n = e.sample(
        |_| std::thread::sleep(Duration::from_millis(5)),
        &SamplingConfig::new().duration(Duration::from_millis(50)),
    );
    assert!(n >= 1);
    assert!(n < 50);
}

#[test]
fn should_record_stopwatch_laps() {
    let e = Experiment::new("laps");
    let mut sw = e.new_stopwatch();
    std::thread::sleep(Duration::from_millis(2));
    sw.record("lap", Decorations::new().annotation("first")).reset();
    std::thread::sleep(Duration::from_millis(2));
    sw.record("lap", Decorations::new());

    let entry = e.get("lap");
    assert_eq!(entry.kind, EntryKind::Duration);
    assert_eq!(entry.durations.len(), 2);
    assert!(entry.durations.iter().all(|d| *d >= Duration::from_millis(2)));
    assert_eq!(entry.annotations[0], "first");
}

#[test]
fn should_rank_experiments_by_duration() {
    let fast = Experiment::new("fast");
    let slow = Experiment::new("slow");
    for ms in [1, 2, 3] {
        fast.record_duration("op", Duration::from_millis(ms), Decorations::new());
        slow.record_duration("op", Duration::from_millis(ms * 10), Decorations::new());
    }

    let ranking = rank_stats(
        RankingCriteria::LowerMeanIsBetter,
        vec![slow.get_stats("op"), fast.get_stats("op")],
    );
    assert_eq!(ranking.winner().experiment_name, "fast");
    assert_eq!(ranking.stats[1].experiment_name, "slow");
}

#[test]
fn should_render_plain_report_without_escape_codes() {
    let e = Experiment::new("render");
    e.record_note("cold cache", Decorations::new().style(Style::Yellow));
    e.record_duration(
        "fetch",
        Duration::from_micros(1500),
        Decorations::new().precision(Precision::duration(Duration::from_millis(1))),
    );

    let plain = e.report(false);
    assert!(!plain.contains('\u{1b}'));
    assert!(plain.contains("render"));
    assert!(plain.contains("cold cache"));
    assert!(plain.contains("fetch"));
    assert!(plain.contains("2ms"));
}

#[test]
fn should_return_invalid_entry_for_unknown_name() {
    let e = Experiment::new("empty");
    assert_eq!(e.get("missing").kind, EntryKind::Invalid);
    assert_eq!(e.get_stats("missing").n, 0);
}
