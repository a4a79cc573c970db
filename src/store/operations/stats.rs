use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// Per-learner accuracy history for one vocabulary entry, plus the
/// selection weight derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabStats {
    pub learner_id: String,
    pub vocabulary_id: String,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub accuracy_rate: f64,
    pub weight: f64,
    pub last_tested_at: Option<DateTime<Utc>>,
}

/// 正答率が低い単語ほど出題されやすくする:
/// 全問正解で 1.0（未出題と同じ）、全問不正解で 3.0。
pub fn weight_from_accuracy(accuracy_rate: f64) -> f64 {
    (1.0 + (1.0 - accuracy_rate) * 2.0).clamp(1.0, 3.0)
}

impl Store {
    /// Fold one answered question into the learner's stats for that
    /// entry and recompute the weight.
    pub fn record_answer_stat(
        &self,
        learner_id: &str,
        vocabulary_id: &str,
        is_correct: bool,
    ) -> Result<VocabStats, StoreError> {
        let key = keys::vocab_stats_key(learner_id, vocabulary_id);

        let mut stats = match self.vocab_stats.get(key.as_bytes())? {
            Some(raw) => Self::deserialize(&raw)?,
            None => VocabStats {
                learner_id: learner_id.to_string(),
                vocabulary_id: vocabulary_id.to_string(),
                total_attempts: 0,
                correct_attempts: 0,
                accuracy_rate: 0.0,
                weight: 1.0,
                last_tested_at: None,
            },
        };

        stats.total_attempts += 1;
        stats.correct_attempts += u32::from(is_correct);
        stats.accuracy_rate = f64::from(stats.correct_attempts) / f64::from(stats.total_attempts);
        stats.weight = weight_from_accuracy(stats.accuracy_rate);
        stats.last_tested_at = Some(Utc::now());

        self.vocab_stats
            .insert(key.as_bytes(), Self::serialize(&stats)?)?;
        Ok(stats)
    }

    /// Weight per vocabulary id for one learner; entries never tested
    /// are simply absent (the sampler defaults those to 1.0).
    pub fn get_weight_map(&self, learner_id: &str) -> Result<HashMap<String, f64>, StoreError> {
        let prefix = keys::vocab_stats_prefix(learner_id);
        let mut weights = HashMap::new();
        for item in self.vocab_stats.scan_prefix(prefix.as_bytes()) {
            let (_, raw) = item?;
            let stats: VocabStats = Self::deserialize(&raw)?;
            weights.insert(stats.vocabulary_id, stats.weight);
        }
        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> (Store, tempfile::TempDir) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store =
            Store::open(tmp.path().join("stats.sled").to_str().unwrap()).expect("open store");
        (store, tmp)
    }

    #[test]
    fn weight_grows_as_accuracy_drops() {
        assert!((weight_from_accuracy(1.0) - 1.0).abs() < 1e-9);
        assert!((weight_from_accuracy(0.5) - 2.0).abs() < 1e-9);
        assert!((weight_from_accuracy(0.0) - 3.0).abs() < 1e-9);
        assert!(weight_from_accuracy(0.25) > weight_from_accuracy(0.75));
    }

    #[test]
    fn recording_answers_accumulates() {
        let (store, _tmp) = open_store();

        let stats = store.record_answer_stat("l1", "v1", true).unwrap();
        assert_eq!(stats.total_attempts, 1);
        assert_eq!(stats.correct_attempts, 1);
        assert!((stats.weight - 1.0).abs() < 1e-9);

        let stats = store.record_answer_stat("l1", "v1", false).unwrap();
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.correct_attempts, 1);
        assert!((stats.accuracy_rate - 0.5).abs() < 1e-9);
        assert!((stats.weight - 2.0).abs() < 1e-9);
    }

    #[test]
    fn weight_map_is_scoped_per_learner() {
        let (store, _tmp) = open_store();
        store.record_answer_stat("l1", "v1", false).unwrap();
        store.record_answer_stat("l1", "v2", true).unwrap();
        store.record_answer_stat("l2", "v1", true).unwrap();

        let weights = store.get_weight_map("l1").unwrap();
        assert_eq!(weights.len(), 2);
        assert!((weights["v1"] - 3.0).abs() < 1e-9);
        assert!((weights["v2"] - 1.0).abs() < 1e-9);
    }
}
