use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{GradeFilter, Record, RecordForm, Scores, SortOrder, View, Views, SUBJECTS};
use crate::views;

pub const MIN_NAME_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewOptions {
    pub filter: GradeFilter,
    pub sort: SortOrder,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub state: AppState,
    pub inserted: usize,
    pub rejected: Vec<ValidationError>,
}

/// Everything the shell knows about the session. Updates return a new state;
/// the roster is replaced as a whole, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    roster: Vec<Record>,
    view: View,
    options: ViewOptions,
}

impl AppState {
    pub fn new(roster: Vec<Record>) -> Self {
        Self {
            roster,
            ..Self::default()
        }
    }

    pub fn roster(&self) -> &[Record] {
        &self.roster
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn options(&self) -> ViewOptions {
        self.options
    }

    pub fn navigate(&self, view: View) -> Self {
        Self {
            view,
            ..self.clone()
        }
    }

    pub fn with_options(&self, options: ViewOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }

    /// Validates `form` and prepends the new record, switching to the dashboard.
    pub fn add(&self, form: &RecordForm, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let record = self.validate(form, now)?;
        debug!(id = %record.id, name = %record.name, "record accepted");

        let roster = std::iter::once(record)
            .chain(self.roster.iter().cloned())
            .collect();

        Ok(Self {
            roster,
            view: View::Dashboard,
            options: self.options,
        })
    }

    /// Drops every record with `id`. Returns the new state and how many were removed.
    pub fn delete(&self, id: &str) -> (Self, usize) {
        let roster: Vec<Record> = self
            .roster
            .iter()
            .filter(|record| record.id != id)
            .cloned()
            .collect();
        let removed = self.roster.len() - roster.len();

        (
            Self {
                roster,
                ..self.clone()
            },
            removed,
        )
    }

    /// Adds each form the way `add` does, last row first, so the file's first row
    /// ends up at the top of the roster. Rejected rows are collected, not fatal.
    pub fn import(&self, forms: &[RecordForm], now: DateTime<Utc>) -> ImportOutcome {
        let mut state = self.clone();
        let mut inserted = 0;
        let mut rejected = Vec::new();

        for form in forms.iter().rev() {
            match state.add(form, now) {
                Ok(next) => {
                    state = next;
                    inserted += 1;
                }
                Err(err) => rejected.push(err),
            }
        }

        ImportOutcome {
            state,
            inserted,
            rejected,
        }
    }

    pub fn views(&self) -> Views {
        views::recompute_all(&self.roster, &self.options)
    }

    fn validate(&self, form: &RecordForm, now: DateTime<Utc>) -> Result<Record, ValidationError> {
        let name = form.name.trim();
        if name.chars().count() < MIN_NAME_LEN {
            return Err(ValidationError::NameTooShort {
                name: name.to_string(),
                min: MIN_NAME_LEN,
            });
        }

        let mut scores = BTreeMap::new();
        for (subject, raw) in SUBJECTS.iter().zip(form.scores.iter()) {
            let score = parse_score(raw).ok_or_else(|| ValidationError::InvalidScore {
                subject: subject.to_string(),
                raw: raw.clone(),
            })?;
            scores.insert(subject.to_string(), score);
        }
        // Every value was range-checked above and SUBJECTS is non-empty.
        let scores = Scores::try_from(scores).map_err(|_| ValidationError::InvalidScore {
            subject: SUBJECTS[0].to_string(),
            raw: form.scores[0].clone(),
        })?;

        let id = match form.id.trim() {
            "" => format!("ID-{}", Uuid::new_v4().simple()),
            id => id.to_string(),
        };
        if self.roster.iter().any(|record| record.id == id) {
            return Err(ValidationError::DuplicateId { id });
        }

        Ok(Record {
            id,
            name: name.to_string(),
            scores,
            created_at: now,
        })
    }
}

fn parse_score(raw: &str) -> Option<u8> {
    let value: i64 = raw.trim().parse().ok()?;
    u8::try_from(value).ok().filter(|score| *score <= 100)
}
