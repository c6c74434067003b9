use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::grading;
use crate::models::{Record, RecordForm, Scores, SUBJECTS};

/// The single key the whole roster lives under.
pub const STORAGE_KEY: &str = "roster";

pub const CSV_HEADER: [&str; 8] = [
    "ID", "Name", "Value 1", "Value 2", "Value 3", "Value 4", "Average", "Level",
];

/// Key-value persistence. Each key maps to one opaque string payload.
pub enum Store {
    File { dir: PathBuf },
    Postgres(PgPool),
}

impl Store {
    pub async fn connect(config: &StoreConfig) -> anyhow::Result<Self> {
        match config {
            StoreConfig::File { dir } => Ok(Store::File { dir: dir.clone() }),
            StoreConfig::Postgres { url } => {
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(url)
                    .await
                    .context("failed to connect to Postgres")?;
                Ok(Store::Postgres(pool))
            }
        }
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        match self {
            Store::File { dir } => tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display())),
            Store::Postgres(pool) => {
                sqlx::migrate!("./migrations").run(pool).await?;
                Ok(())
            }
        }
    }

    pub async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        match self {
            Store::File { dir } => {
                let path = entry_path(dir, key);
                match tokio::fs::read_to_string(&path).await {
                    Ok(payload) => Ok(Some(payload)),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                    Err(err) => {
                        Err(err).with_context(|| format!("failed to read {}", path.display()))
                    }
                }
            }
            Store::Postgres(pool) => {
                let row = sqlx::query("SELECT payload FROM roster_store.entries WHERE key = $1")
                    .bind(key)
                    .fetch_optional(pool)
                    .await?;
                Ok(row.map(|row| row.get("payload")))
            }
        }
    }

    pub async fn write(&self, key: &str, payload: &str) -> anyhow::Result<()> {
        match self {
            Store::File { dir } => {
                tokio::fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                let path = entry_path(dir, key);
                tokio::fs::write(&path, payload)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))
            }
            Store::Postgres(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO roster_store.entries (key, payload, updated_at)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (key) DO UPDATE
                    SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at
                    "#,
                )
                .bind(key)
                .bind(payload)
                .bind(Utc::now())
                .execute(pool)
                .await?;
                Ok(())
            }
        }
    }
}

fn entry_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

pub fn seed_roster() -> anyhow::Result<Vec<Record>> {
    let seeds: [(&str, &str, [u8; 4], (i32, u32, u32)); 10] = [
        ("ID-1001", "Person 1", [92, 88, 95, 90], (2026, 1, 10)),
        ("ID-1002", "Person 2", [78, 82, 75, 80], (2026, 1, 12)),
        ("ID-1003", "Person 3", [95, 98, 92, 96], (2026, 1, 15)),
        ("ID-1004", "Person 4", [65, 70, 68, 62], (2026, 1, 18)),
        ("ID-1005", "Person 5", [88, 85, 90, 87], (2026, 1, 20)),
        ("ID-1006", "Person 6", [55, 60, 58, 52], (2026, 1, 22)),
        ("ID-1007", "Person 7", [100, 99, 98, 100], (2026, 1, 25)),
        ("ID-1008", "Person 8", [82, 79, 85, 81], (2026, 1, 28)),
        ("ID-1009", "Person 9", [74, 76, 72, 78], (2026, 2, 1)),
        ("ID-1010", "Person 10", [91, 89, 93, 88], (2026, 2, 5)),
    ];

    seeds
        .into_iter()
        .map(|(id, name, values, (year, month, day))| -> anyhow::Result<Record> {
            let created_at = NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .context("invalid date")?
                .and_utc();
            let scores: BTreeMap<String, u8> = SUBJECTS
                .iter()
                .zip(values)
                .map(|(subject, score)| (subject.to_string(), score))
                .collect();
            Ok(Record {
                id: id.to_string(),
                name: name.to_string(),
                scores: Scores::try_from(scores)?,
                created_at,
            })
        })
        .collect()
}

/// Persisted roster, or `None` when nothing usable is stored.
pub async fn load_persisted(store: &Store) -> Option<Vec<Record>> {
    let payload = match store.read(STORAGE_KEY).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            debug!("no persisted roster");
            return None;
        }
        Err(err) => {
            warn!(error = %err, "could not read persisted roster");
            return None;
        }
    };

    match serde_json::from_str(&payload) {
        Ok(roster) => Some(roster),
        Err(err) => {
            warn!(error = %err, "persisted roster is unreadable");
            None
        }
    }
}

/// Waits out the simulated latency once, then yields the persisted roster or the seed.
pub async fn load(store: &Store, delay: Duration) -> anyhow::Result<Vec<Record>> {
    tokio::time::sleep(delay).await;

    if let Some(roster) = load_persisted(store).await {
        info!(records = roster.len(), "loaded persisted roster");
        return Ok(roster);
    }

    let roster = seed_roster()?;
    info!(records = roster.len(), "using seed roster");
    Ok(roster)
}

pub async fn save_roster(store: &Store, roster: &[Record]) -> anyhow::Result<()> {
    let payload = serde_json::to_string(roster).context("failed to serialize roster")?;
    store.write(STORAGE_KEY, &payload).await?;
    debug!(records = roster.len(), "roster saved");
    Ok(())
}

/// Writes the roster in roster order. Fields containing commas or quotes get quoted.
pub fn export_csv<W: io::Write>(roster: &[Record], writer: W) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADER)?;

    for record in roster {
        let average = grading::average(&record.scores);
        let mut row = vec![record.id.clone(), record.name.clone()];
        row.extend(SUBJECTS.iter().map(|subject| {
            record
                .scores
                .get(subject)
                .map(|score| score.to_string())
                .unwrap_or_default()
        }));
        row.push(average.to_string());
        row.push(average.letter().to_string());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Reads rows in the export layout as raw form input. `Average` and `Level` are ignored.
pub fn read_csv_forms<R: io::Read>(reader: R) -> anyhow::Result<Vec<RecordForm>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        #[serde(rename = "ID")]
        id: String,
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Value 1")]
        value1: String,
        #[serde(rename = "Value 2")]
        value2: String,
        #[serde(rename = "Value 3")]
        value3: String,
        #[serde(rename = "Value 4")]
        value4: String,
    }

    let mut reader = csv::Reader::from_reader(reader);
    let mut forms = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        forms.push(RecordForm {
            id: row.id,
            name: row.name,
            scores: [row.value1, row.value2, row.value3, row.value4],
        });
    }

    Ok(forms)
}

pub fn import_csv(csv_path: &Path) -> anyhow::Result<Vec<RecordForm>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    read_csv_forms(file)
}
