//! Performance history and adaptive algorithm weights.

use super::config::LearningConfig;
use super::store::KeyValueStore;
use crate::error::{OptimizerError, Result};
use crate::hybrid::Distribution;
use crate::model::{Algorithm, ContestType, Lineup};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Outcome of one algorithm within one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub timestamp: DateTime<Utc>,
    pub strategy: String,
    pub algorithm: Algorithm,
    /// Mean ROI of the lineups (0 when unknown).
    pub roi: f64,
    /// Mean NexusScore total.
    pub nexus_score: f64,
    /// Mean pairwise Jaccard distance, in [0, 1].
    pub diversity: f64,
    pub contest_type: Option<ContestType>,
    pub complexity: f64,
}

impl PerformanceRecord {
    /// Summarizes the lineups an algorithm contributed to a run.
    pub fn from_lineups(
        strategy: &str,
        algorithm: Algorithm,
        lineups: &[Lineup],
        contest_type: Option<ContestType>,
        complexity: f64,
    ) -> Self {
        let mean = |f: fn(&Lineup) -> f64| {
            if lineups.is_empty() {
                0.0
            } else {
                lineups.iter().map(f).sum::<f64>() / lineups.len() as f64
            }
        };
        Self {
            timestamp: Utc::now(),
            strategy: strategy.to_string(),
            algorithm,
            roi: mean(|l| l.scores.roi),
            nexus_score: mean(|l| l.score.total),
            diversity: diversity_score(lineups),
            contest_type,
            complexity,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Mean pairwise Jaccard distance between the lineups' player sets.
///
/// 0 for fewer than two lineups or identical lineups, 1 when no two
/// lineups share a player.
pub fn diversity_score(lineups: &[Lineup]) -> f64 {
    if lineups.len() < 2 {
        return 0.0;
    }
    let sets: Vec<HashSet<&str>> = lineups
        .iter()
        .map(|l| l.players().map(|p| p.id.as_str()).collect())
        .collect();

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            let union = sets[i].union(&sets[j]).count();
            let shared = sets[i].intersection(&sets[j]).count();
            total += if union == 0 { 0.0 } else { 1.0 - shared as f64 / union as f64 };
            pairs += 1;
        }
    }
    total / pairs as f64
}

/// Aggregates for one algorithm over the retained history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmStats {
    pub algorithm: Algorithm,
    pub runs: usize,
    pub avg_roi: f64,
    pub avg_nexus_score: f64,
    pub avg_diversity: f64,
    pub weight: f64,
}

#[derive(Debug, Default)]
struct LearningState {
    history: VecDeque<PerformanceRecord>,
    weights: BTreeMap<Algorithm, f64>,
}

/// Bounded performance history with per-algorithm weights.
///
/// Shared across runs behind an `Arc`; every update takes one lock so
/// concurrent runs cannot lose records.
pub struct PerformanceTracker {
    store: Arc<dyn KeyValueStore>,
    config: LearningConfig,
    state: Mutex<LearningState>,
}

impl std::fmt::Debug for PerformanceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceTracker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PerformanceTracker {
    /// Loads persisted history and weights from `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, config: LearningConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|m| OptimizerError::invalid_config("learning", m))?;

        let mut history: VecDeque<PerformanceRecord> = match store.get(&config.history_key)? {
            Some(blob) => serde_json::from_str(&blob)?,
            None => VecDeque::new(),
        };
        while history.len() > config.history_cap {
            history.pop_front();
        }
        let weights = match store.get(&config.weights_key)? {
            Some(blob) => serde_json::from_str(&blob)?,
            None => BTreeMap::new(),
        };
        debug!(records = history.len(), "learning state loaded");

        Ok(Self {
            store,
            config,
            state: Mutex::new(LearningState { history, weights }),
        })
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LearningState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a record, updates its algorithm's weight and persists.
    ///
    /// Returns the new weight when the algorithm had enough history to move
    /// it. The in-memory update stands even if persisting fails.
    pub fn record(&self, record: PerformanceRecord) -> Result<Option<f64>> {
        let mut state = self.lock();
        let algorithm = record.algorithm;
        state.history.push_back(record);
        while state.history.len() > self.config.history_cap {
            state.history.pop_front();
        }

        let updated = self.composite(&state.history, algorithm).map(|composite| {
            let target = (composite / self.config.reference_score)
                .clamp(self.config.min_weight, self.config.max_weight);
            let old = state.weights.get(&algorithm).copied().unwrap_or(1.0);
            let rho = self.config.reaction_factor;
            let new = old * (1.0 - rho) + target * rho;
            state.weights.insert(algorithm, new);
            debug!(%algorithm, composite, old, new, "algorithm weight updated");
            new
        });

        // Persist while still holding the lock so snapshots land in order.
        let history = serde_json::to_string(&state.history)?;
        let weights = serde_json::to_string(&state.weights)?;
        self.store.set(&self.config.history_key, history)?;
        self.store.set(&self.config.weights_key, weights)?;
        drop(state);
        Ok(updated)
    }

    /// `0.4 * ROI + 0.4 * NexusScore + 0.2 * diversity * 100`, averaged over
    /// the algorithm's records, once it has `min_records` of them.
    fn composite(&self, history: &VecDeque<PerformanceRecord>, algorithm: Algorithm) -> Option<f64> {
        let records: Vec<&PerformanceRecord> = history.iter().filter(|r| r.algorithm == algorithm).collect();
        if records.len() < self.config.min_records {
            return None;
        }
        let n = records.len() as f64;
        let roi = records.iter().map(|r| r.roi).sum::<f64>() / n;
        let nexus = records.iter().map(|r| r.nexus_score).sum::<f64>() / n;
        let diversity = records.iter().map(|r| r.diversity).sum::<f64>() / n;
        Some(0.4 * roi + 0.4 * nexus + 0.2 * diversity * 100.0)
    }

    /// Current weight of `algorithm`; 1.0 until it has moved.
    pub fn weight(&self, algorithm: Algorithm) -> f64 {
        self.lock().weights.get(&algorithm).copied().unwrap_or(1.0)
    }

    /// Weights of every algorithm.
    pub fn weights(&self) -> BTreeMap<Algorithm, f64> {
        let state = self.lock();
        Algorithm::ALL
            .into_iter()
            .map(|a| (a, state.weights.get(&a).copied().unwrap_or(1.0)))
            .collect()
    }

    /// Retained records, oldest first.
    pub fn history(&self) -> Vec<PerformanceRecord> {
        self.lock().history.iter().cloned().collect()
    }

    pub fn algorithm_stats(&self) -> Vec<AlgorithmStats> {
        let state = self.lock();
        Algorithm::ALL
            .into_iter()
            .map(|algorithm| {
                let records: Vec<&PerformanceRecord> =
                    state.history.iter().filter(|r| r.algorithm == algorithm).collect();
                let n = records.len().max(1) as f64;
                AlgorithmStats {
                    algorithm,
                    runs: records.len(),
                    avg_roi: records.iter().map(|r| r.roi).sum::<f64>() / n,
                    avg_nexus_score: records.iter().map(|r| r.nexus_score).sum::<f64>() / n,
                    avg_diversity: records.iter().map(|r| r.diversity).sum::<f64>() / n,
                    weight: state.weights.get(&algorithm).copied().unwrap_or(1.0),
                }
            })
            .collect()
    }

    /// Scales each share by its algorithm's weight and renormalizes to 100.
    pub fn reweight(&self, distribution: &Distribution) -> Distribution {
        let weights = self.weights();
        let scaled: Distribution = distribution
            .iter()
            .map(|(a, pct)| (*a, pct * weights.get(a).copied().unwrap_or(1.0)))
            .collect();
        let total: f64 = scaled.values().sum();
        if total <= 0.0 {
            return distribution.clone();
        }
        scaled.into_iter().map(|(a, v)| (a, v / total * 100.0)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::hybrid::default_distribution;
    use crate::learning::MemoryStore;
    use crate::model::ScoreCard;

    fn record(algorithm: Algorithm, roi: f64, nexus: f64, diversity: f64) -> PerformanceRecord {
        PerformanceRecord {
            timestamp: Utc::now(),
            strategy: "balanced".into(),
            algorithm,
            roi,
            nexus_score: nexus,
            diversity,
            contest_type: Some(ContestType::Gpp),
            complexity: 3.0,
        }
    }

    fn tracker(store: Arc<MemoryStore>) -> PerformanceTracker {
        PerformanceTracker::new(store, LearningConfig::default()).unwrap()
    }

    /// Stalls the first history write until released.
    struct SlowStore {
        inner: MemoryStore,
        stalled: std::sync::atomic::AtomicBool,
        entered: std::sync::atomic::AtomicBool,
    }

    impl KeyValueStore for SlowStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: String) -> Result<()> {
            use std::sync::atomic::Ordering;
            if key == LearningConfig::default().history_key && !self.stalled.swap(true, Ordering::SeqCst) {
                self.entered.store(true, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_concurrent_records_persist_in_order() {
        use std::sync::atomic::{AtomicBool, Ordering};
        let store = Arc::new(SlowStore {
            inner: MemoryStore::new(),
            stalled: AtomicBool::new(false),
            entered: AtomicBool::new(false),
        });
        let t = Arc::new(PerformanceTracker::new(store.clone(), LearningConfig::default()).unwrap());

        let first = {
            let t = Arc::clone(&t);
            std::thread::spawn(move || t.record(record(Algorithm::Annealing, 0.0, 100.0, 0.5)))
        };
        while !store.entered.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        let second = {
            let t = Arc::clone(&t);
            std::thread::spawn(move || t.record(record(Algorithm::Stochastic, 0.0, 120.0, 0.4)))
        };
        first.join().unwrap().unwrap();
        second.join().unwrap().unwrap();

        assert_eq!(t.history().len(), 2);
        let reloaded = PerformanceTracker::new(store, LearningConfig::default()).unwrap();
        assert_eq!(reloaded.history().len(), 2);
    }

    #[test]
    fn test_weight_waits_for_min_records() {
        let t = tracker(Arc::new(MemoryStore::new()));
        for _ in 0..9 {
            assert_eq!(t.record(record(Algorithm::Annealing, 0.0, 200.0, 0.5)).unwrap(), None);
        }
        assert_eq!(t.weight(Algorithm::Annealing), 1.0);
        // composite = 0.4*200 + 0.2*50 = 90 -> target 0.9 -> 0.9*1 + 0.1*0.9
        let w = t.record(record(Algorithm::Annealing, 0.0, 200.0, 0.5)).unwrap().unwrap();
        assert!((w - 0.99).abs() < 1e-9);
        assert_eq!(t.weight(Algorithm::Stochastic), 1.0);
    }

    #[test]
    fn test_target_clamped() {
        let t = tracker(Arc::new(MemoryStore::new()));
        let mut w = 1.0;
        for _ in 0..10 {
            if let Some(new) = t.record(record(Algorithm::Stochastic, 1_000.0, 1_000.0, 1.0)).unwrap() {
                w = new;
            }
        }
        // target clamps to 2.0
        assert!((w - 1.1).abs() < 1e-9);
        for _ in 0..200 {
            t.record(record(Algorithm::Stochastic, 1_000.0, 1_000.0, 1.0)).unwrap();
        }
        assert!(t.weight(Algorithm::Stochastic) <= 2.0);
        assert!(t.weight(Algorithm::Stochastic) > 1.9);
    }

    #[test]
    fn test_history_bounded() {
        let store = Arc::new(MemoryStore::new());
        let t = PerformanceTracker::new(store, LearningConfig::default().with_history_cap(5)).unwrap();
        for i in 0..8 {
            t.record(record(Algorithm::Evolutionary, i as f64, 0.0, 0.0)).unwrap();
        }
        let history = t.history();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].roi, 3.0);
        assert_eq!(history[4].roi, 7.0);
    }

    #[test]
    fn test_state_persists_across_trackers() {
        let store = Arc::new(MemoryStore::new());
        let first = tracker(Arc::clone(&store));
        for _ in 0..10 {
            first.record(record(Algorithm::Annealing, 50.0, 150.0, 0.4)).unwrap();
        }
        let weight = first.weight(Algorithm::Annealing);
        drop(first);

        let second = tracker(store);
        assert_eq!(second.history().len(), 10);
        assert_eq!(second.weight(Algorithm::Annealing), weight);
    }

    #[test]
    fn test_concurrent_records_not_lost() {
        let t = Arc::new(tracker(Arc::new(MemoryStore::new())));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let t = Arc::clone(&t);
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        t.record(record(Algorithm::ALL[i % 3], 1.0, 100.0, 0.3)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(t.history().len(), 40);
        let runs: usize = t.algorithm_stats().iter().map(|s| s.runs).sum();
        assert_eq!(runs, 40);
    }

    #[test]
    fn test_storage_failure_surfaces() {
        struct ReadOnly;
        impl KeyValueStore for ReadOnly {
            fn get(&self, _key: &str) -> Result<Option<String>> {
                Ok(None)
            }
            fn set(&self, key: &str, _value: String) -> Result<()> {
                Err(OptimizerError::Storage {
                    key: key.into(),
                    message: "read-only".into(),
                })
            }
        }
        let t = PerformanceTracker::new(Arc::new(ReadOnly), LearningConfig::default()).unwrap();
        let err = t.record(record(Algorithm::Annealing, 0.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, OptimizerError::Storage { .. }));
        // the in-memory update still happened
        assert_eq!(t.history().len(), 1);
    }

    #[test]
    fn test_corrupt_blob_is_serialization_error() {
        let store = Arc::new(MemoryStore::new());
        store.set("nexus.performance_history", "[{oops".into()).unwrap();
        let err = PerformanceTracker::new(store, LearningConfig::default()).unwrap_err();
        assert!(matches!(err, OptimizerError::Serialization(_)));
    }

    #[test]
    fn test_reweight_renormalizes() {
        let t = tracker(Arc::new(MemoryStore::new()));
        assert_eq!(t.reweight(&default_distribution()), default_distribution());
        for _ in 0..10 {
            t.record(record(Algorithm::Annealing, 300.0, 300.0, 1.0)).unwrap();
        }
        let d = t.reweight(&default_distribution());
        assert!((d.values().sum::<f64>() - 100.0).abs() < 1e-9);
        assert!(d[&Algorithm::Annealing] > 30.0);
    }

    #[test]
    fn test_diversity_score() {
        let ctx = fixtures::sample_context();
        let roster = ctx.greedy_roster().unwrap();
        let a = ctx.to_lineup(&roster, Algorithm::Stochastic, ScoreCard::default());
        assert_eq!(diversity_score(&[a.clone()]), 0.0);
        assert_eq!(diversity_score(&[a.clone(), a.clone()]), 0.0);

        let mut b = a.clone();
        b.captain.id = "other".into();
        // 6 shared of 8 distinct ids
        let d = diversity_score(&[a, b]);
        assert!((d - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_record_from_lineups() {
        let ctx = fixtures::sample_context();
        let roster = ctx.greedy_roster().unwrap();
        let lineup = ctx.to_lineup(&roster, Algorithm::Annealing, ScoreCard::default());
        let r = PerformanceRecord::from_lineups("x", Algorithm::Annealing, &[lineup.clone()], None, 0.0);
        assert_eq!(r.nexus_score, lineup.score.total);
        assert_eq!(r.roi, 0.0);
        assert_eq!(r.diversity, 0.0);
    }
}
