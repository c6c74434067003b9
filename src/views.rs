use std::cmp::Ordering;

use crate::grading::{self, PASSING_AVERAGE};
use crate::models::{Average, Record, RecordRow, Report, SortOrder, Stats, Views};
use crate::state::ViewOptions;

/// Rows shown on the dashboard table, most recent first.
pub const DASHBOARD_ROWS: usize = 5;
/// Entries in each half of the top/bottom report.
pub const REPORT_SIZE: usize = 3;

/// Rebuilds every derived view from scratch. Nothing is cached between calls.
pub fn recompute_all(roster: &[Record], options: &ViewOptions) -> Views {
    let table = roster.iter().take(DASHBOARD_ROWS).map(to_row).collect();

    let mut cards = grading::filter_by_grade(roster, options.filter);
    sort_records(&mut cards, options.sort);

    Views {
        table,
        cards: cards.iter().map(to_row).collect(),
        stats: stats(roster),
        report: report(roster),
    }
}

pub fn to_row(record: &Record) -> RecordRow {
    let average = grading::average(&record.scores);
    RecordRow {
        id: record.id.clone(),
        name: record.name.clone(),
        scores: record.scores.clone(),
        average,
        letter: average.letter(),
    }
}

/// Stable sort, so records with equal averages keep their roster order.
pub fn sort_records(records: &mut [Record], order: SortOrder) {
    match order {
        SortOrder::NameAsc => records.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortOrder::NameDesc => records.sort_by(|a, b| compare_names(&b.name, &a.name)),
        SortOrder::AverageAsc => records.sort_by_key(|record| grading::average(&record.scores)),
        SortOrder::AverageDesc => records.sort_by(|a, b| {
            grading::average(&b.scores).cmp(&grading::average(&a.scores))
        }),
    }
}

// Case-folded first so "alice" and "Bob" sort the way a reader expects.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn stats(roster: &[Record]) -> Stats {
    let total = roster.len();
    if total == 0 {
        return Stats {
            total,
            class_average: None,
            top_performer: None,
            passing_rate: None,
        };
    }

    let averages: Vec<Average> = roster
        .iter()
        .map(|record| grading::average(&record.scores))
        .collect();

    let sum: u64 = averages.iter().map(|avg| u64::from(avg.tenths())).sum();
    // Mean of tenths, still in tenths.
    let class_average = Average::from_ratio(sum, total as u64 * 10);

    let mut top = 0;
    for (index, avg) in averages.iter().enumerate() {
        if *avg > averages[top] {
            top = index;
        }
    }

    let passing = averages.iter().filter(|avg| **avg >= PASSING_AVERAGE).count() as u64;
    let passing_rate = ((passing * 200 + total as u64) / (2 * total as u64)) as u8;

    Stats {
        total,
        class_average: Some(class_average),
        top_performer: Some(roster[top].name.clone()),
        passing_rate: Some(passing_rate),
    }
}

/// Top and bottom entries by average, both listed highest first.
pub fn report(roster: &[Record]) -> Report {
    let mut ranked = roster.to_vec();
    sort_records(&mut ranked, SortOrder::AverageDesc);

    let top = ranked.iter().take(REPORT_SIZE).map(to_row).collect();
    let bottom_start = ranked.len().saturating_sub(REPORT_SIZE);
    let bottom = ranked[bottom_start..].iter().map(to_row).collect();

    Report { top, bottom }
}
