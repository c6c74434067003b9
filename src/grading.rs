use crate::models::{Average, GradeFilter, LetterGrade, Record, Scores};

pub const PASSING_AVERAGE: Average = Average::from_tenths(600);

pub fn average(scores: &Scores) -> Average {
    Average::from_ratio(u64::from(scores.total()), scores.len() as u64)
}

pub fn letter_grade(avg: f64) -> LetterGrade {
    if avg >= 90.0 {
        LetterGrade::A
    } else if avg >= 80.0 {
        LetterGrade::B
    } else if avg >= 70.0 {
        LetterGrade::C
    } else if avg >= 60.0 {
        LetterGrade::D
    } else {
        LetterGrade::F
    }
}

pub fn filter_by_grade(records: &[Record], target: GradeFilter) -> Vec<Record> {
    match target {
        GradeFilter::All => records.to_vec(),
        GradeFilter::Only(letter) => records
            .iter()
            .filter(|record| average(&record.scores).letter() == letter)
            .cloned()
            .collect(),
    }
}

pub fn find_by_name<'a>(records: &'a [Record], term: &str) -> Option<&'a Record> {
    let needle = term.to_lowercase();
    records
        .iter()
        .find(|record| record.name.to_lowercase().contains(&needle))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::SUBJECTS;

    pub(crate) fn sample_record(id: &str, name: &str, values: [u8; 4]) -> Record {
        let scores: BTreeMap<String, u8> = SUBJECTS
            .iter()
            .zip(values)
            .map(|(subject, score)| (subject.to_string(), score))
            .collect();
        Record {
            id: id.to_string(),
            name: name.to_string(),
            scores: Scores::try_from(scores).unwrap(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn average_is_mean_with_one_decimal() {
        let scores =
            Scores::try_from(BTreeMap::from([("a".to_string(), 100), ("b".to_string(), 0)]))
                .unwrap();
        assert_eq!(average(&scores).to_string(), "50.0");

        let record = sample_record("ID-1", "Person 1", [92, 88, 95, 90]);
        assert_eq!(average(&record.scores).to_string(), "91.3");

        let record = sample_record("ID-2", "Person 2", [70, 70, 71, 70]);
        assert_eq!(average(&record.scores).to_string(), "70.3");
    }

    #[test]
    fn letter_grade_bands_are_inclusive_below() {
        assert_eq!(letter_grade(89.9), LetterGrade::B);
        assert_eq!(letter_grade(90.0), LetterGrade::A);
        assert_eq!(letter_grade(80.0), LetterGrade::B);
        assert_eq!(letter_grade(70.0), LetterGrade::C);
        assert_eq!(letter_grade(60.0), LetterGrade::D);
        assert_eq!(letter_grade(59.9), LetterGrade::F);
        assert_eq!(letter_grade(0.0), LetterGrade::F);
    }

    #[test]
    fn average_letter_uses_same_bands() {
        assert_eq!(Average::from_tenths(899).letter(), LetterGrade::B);
        assert_eq!(Average::from_tenths(900).letter(), LetterGrade::A);
        assert_eq!(Average::from_tenths(600).letter(), LetterGrade::D);
        assert_eq!(Average::from_tenths(599).letter(), LetterGrade::F);
        assert_eq!(Average::from_tenths(1000).letter(), LetterGrade::A);
    }

    #[test]
    fn filter_all_returns_independent_copy() {
        let records = vec![
            sample_record("ID-1", "Person 1", [92, 88, 95, 90]),
            sample_record("ID-2", "Person 2", [50, 50, 50, 50]),
        ];
        let mut filtered = filter_by_grade(&records, GradeFilter::All);
        assert_eq!(filtered, records);

        filtered.clear();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn filter_by_letter_keeps_order() {
        let records = vec![
            sample_record("ID-1", "Person 1", [92, 88, 95, 90]),
            sample_record("ID-2", "Person 2", [50, 50, 50, 50]),
            sample_record("ID-3", "Person 3", [100, 99, 98, 100]),
        ];
        let filtered = filter_by_grade(&records, GradeFilter::Only(LetterGrade::A));
        let ids: Vec<&str> = filtered.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["ID-1", "ID-3"]);

        assert!(filter_by_grade(&records, GradeFilter::Only(LetterGrade::C)).is_empty());
    }

    #[test]
    fn find_by_name_ignores_case() {
        let records = vec![
            sample_record("ID-1", "Person 1", [92, 88, 95, 90]),
            sample_record("ID-10", "Person 10", [91, 89, 93, 88]),
        ];
        let found = find_by_name(&records, "person 1").unwrap();
        assert_eq!(found.id, "ID-1");

        assert_eq!(find_by_name(&records, "SON 10").unwrap().id, "ID-10");
        assert!(find_by_name(&records, "nobody").is_none());
    }
}
