use std::fmt::{self, Write};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::models::{RecordRow, Stats, View, Views};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Short message for the user, shown once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Info => write!(f, "[ok] {}", self.text),
            Severity::Error => write!(f, "[error] {}", self.text),
        }
    }
}

pub fn render_view(view: View, views: &Views) -> String {
    let mut output = String::new();
    match view {
        View::Dashboard => render_table(&mut output, &views.table),
        View::Students => render_cards(&mut output, &views.cards),
        View::Stats => render_stats(&mut output, &views.stats),
        View::Reports => render_rankings(&mut output, views),
    }
    output
}

fn render_table(output: &mut String, rows: &[RecordRow]) {
    let _ = writeln!(output, "## Recent Entries");
    if rows.is_empty() {
        let _ = writeln!(output, "No records yet.");
        return;
    }

    let _ = writeln!(
        output,
        "| Name | Value 1 | Value 2 | Value 3 | Value 4 | Average | Level |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|");
    for row in rows {
        let scores: Vec<String> = row.scores.iter().map(|(_, score)| score.to_string()).collect();
        let _ = writeln!(
            output,
            "| {} | {} | {}% | {} |",
            row.name,
            scores.join(" | "),
            row.average,
            row.letter
        );
    }
}

fn render_cards(output: &mut String, cards: &[RecordRow]) {
    let _ = writeln!(output, "## Records");
    if cards.is_empty() {
        let _ = writeln!(output, "No records match this filter.");
        return;
    }

    for card in cards {
        let scores: Vec<String> = card
            .scores
            .iter()
            .map(|(subject, score)| format!("{subject} {score}"))
            .collect();
        let _ = writeln!(
            output,
            "- {} (ID: {}) [{}] {} | AVG: {}%",
            card.name,
            card.id,
            card.letter,
            scores.join(", "),
            card.average
        );
    }
}

fn render_stats(output: &mut String, stats: &Stats) {
    let _ = writeln!(output, "## Statistics");
    let _ = writeln!(output, "- Total records: {}", stats.total);

    match (&stats.class_average, &stats.top_performer, stats.passing_rate) {
        (Some(average), Some(top), Some(rate)) => {
            let _ = writeln!(output, "- Class average: {average}%");
            let _ = writeln!(output, "- Top performer: {top}");
            let _ = writeln!(output, "- Passing rate: {rate}%");
        }
        _ => {
            let _ = writeln!(output, "No records to summarize.");
        }
    }
}

fn render_rankings(output: &mut String, views: &Views) {
    let _ = writeln!(output, "## Highest Entries");
    render_ranked(output, &views.report.top);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Entries Below Range");
    render_ranked(output, &views.report.bottom);
}

fn render_ranked(output: &mut String, rows: &[RecordRow]) {
    if rows.is_empty() {
        let _ = writeln!(output, "No records yet.");
        return;
    }
    for row in rows {
        let _ = writeln!(output, "- {} - {}%", row.name, row.average);
    }
}

/// Full markdown report: statistics, rankings and every record card.
pub fn build_report(views: &Views, generated_at: DateTime<Utc>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Roster Report");
    let _ = writeln!(
        output,
        "Generated {} for {} records",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        views.stats.total
    );
    let _ = writeln!(output);
    render_stats(&mut output, &views.stats);
    let _ = writeln!(output);
    render_rankings(&mut output, views);
    let _ = writeln!(output);
    render_cards(&mut output, &views.cards);

    output
}

pub async fn write_report(
    out: &Path,
    views: &Views,
    generated_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    tokio::fs::write(out, build_report(views, generated_at))
        .await
        .with_context(|| format!("failed to write {}", out.display()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::grading::tests::sample_record;
    use crate::state::ViewOptions;
    use crate::views::recompute_all;

    fn sample_views() -> Views {
        let roster = vec![
            sample_record("ID-1", "Person 1", [92, 88, 95, 90]),
            sample_record("ID-2", "Person 2", [55, 60, 58, 52]),
        ];
        recompute_all(&roster, &ViewOptions::default())
    }

    #[test]
    fn dashboard_lists_scores_and_level() {
        let output = render_view(View::Dashboard, &sample_views());
        assert!(output.contains("| Person 1 | 92 | 88 | 95 | 90 | 91.3% | A |"));
        assert!(output.contains("| Person 2 | 55 | 60 | 58 | 52 | 56.3% | F |"));
    }

    #[test]
    fn students_view_shows_cards() {
        let output = render_view(View::Students, &sample_views());
        assert!(output.contains("- Person 1 (ID: ID-1) [A] value1 92, value2 88, value3 95, value4 90 | AVG: 91.3%"));
    }

    #[test]
    fn stats_view_handles_empty_roster() {
        let views = recompute_all(&[], &ViewOptions::default());
        let output = render_view(View::Stats, &views);
        assert!(output.contains("- Total records: 0"));
        assert!(output.contains("No records to summarize."));
    }

    #[test]
    fn report_contains_every_section() {
        let generated_at = Utc.with_ymd_and_hms(2026, 2, 10, 9, 30, 0).unwrap();
        let report = build_report(&sample_views(), generated_at);

        assert!(report.starts_with("# Roster Report\nGenerated 2026-02-10 09:30 UTC for 2 records"));
        assert!(report.contains("- Class average: 73.8%"));
        assert!(report.contains("- Top performer: Person 1"));
        assert!(report.contains("- Passing rate: 50%"));
        assert!(report.contains("## Highest Entries\n- Person 1 - 91.3%\n- Person 2 - 56.3%"));
        assert!(report.contains("## Entries Below Range\n- Person 1 - 91.3%\n- Person 2 - 56.3%"));
        assert!(report.contains("## Records"));
    }

    #[tokio::test]
    async fn report_file_is_written_with_context_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let generated_at = Utc.with_ymd_and_hms(2026, 2, 10, 9, 30, 0).unwrap();

        let out = dir.path().join("report.md");
        write_report(&out, &sample_views(), generated_at).await.unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.starts_with("# Roster Report"));

        let missing = dir.path().join("missing").join("report.md");
        let err = write_report(&missing, &sample_views(), generated_at)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to write"), "{err}");
    }

    #[test]
    fn notices_show_severity() {
        assert_eq!(Notice::info("Entry added.").to_string(), "[ok] Entry added.");
        assert_eq!(
            Notice::error("Please ensure all fields are valid.").to_string(),
            "[error] Please ensure all fields are valid."
        );
    }
}
