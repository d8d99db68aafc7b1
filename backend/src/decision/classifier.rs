// =============================================================================
// Signal classifier contract and lazily-initialised handle
// =============================================================================
//
// The handle owns the only process-wide state in the pipeline: the loaded
// classifier. It is built once, on first use, behind a `OnceLock`:
//
//   * at most one load attempt runs; concurrent first callers block on it
//   * a failed load is remembered and every later call gets `None`
//   * a loaded classifier is immutable and shared as `Arc<dyn ...>`
// =============================================================================

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use super::features::FeatureVector;
use super::forest::RandomForest;

/// Raw classifier output.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// -1 (sell), 0 (hold) or 1 (buy).
    pub label: i8,
    /// Probability per class label.
    pub probabilities: Vec<(i8, f64)>,
}

impl Prediction {
    /// Highest class probability, after checking the output is well formed.
    ///
    /// Fails when the label is not one of -1/0/1, the probability list is
    /// empty, or any probability is non-finite or outside [0, 1].
    pub fn confidence(&self) -> Result<f64> {
        if !(-1..=1).contains(&self.label) {
            anyhow::bail!("classifier returned label {} outside -1..=1", self.label);
        }
        if self.probabilities.is_empty() {
            anyhow::bail!("classifier returned no class probabilities");
        }
        let mut best = 0.0_f64;
        for &(label, p) in &self.probabilities {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                anyhow::bail!("classifier returned probability {} for label {}", p, label);
            }
            best = best.max(p);
        }
        Ok(best)
    }
}

/// A pre-trained buy/sell/hold classifier.
pub trait SignalClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction>;

    /// Model name for logs and `/health`.
    fn name(&self) -> &str;

    /// Content fingerprint of the loaded artifact, if known.
    fn fingerprint(&self) -> Option<&str> {
        None
    }
}

type Loader = Box<dyn Fn() -> Result<Arc<dyn SignalClassifier>> + Send + Sync>;

/// Classifier availability as reported by `/health`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClassifierStatus {
    NotLoaded,
    Ready {
        name: String,
        fingerprint: Option<String>,
    },
    Unavailable {
        reason: String,
    },
}

pub struct ClassifierHandle {
    loader: Loader,
    cell: OnceLock<std::result::Result<Arc<dyn SignalClassifier>, String>>,
}

impl ClassifierHandle {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn SignalClassifier>> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            cell: OnceLock::new(),
        }
    }

    /// Handle that loads a random-forest artifact from `path` on first use.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(move || {
            let forest = RandomForest::load(&path)?;
            Ok(Arc::new(forest) as Arc<dyn SignalClassifier>)
        })
    }

    /// Handle wrapping an already-built classifier.
    #[cfg(test)]
    pub fn ready(classifier: Arc<dyn SignalClassifier>) -> Self {
        let handle = Self::new(|| anyhow::bail!("classifier already initialised"));
        let _ = handle.cell.set(Ok(classifier));
        handle
    }

    /// Handle that never yields a classifier.
    #[cfg(test)]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(move || anyhow::bail!("{}", reason))
    }

    /// The classifier, loading it on first call. `None` once loading failed.
    pub fn get(&self) -> Option<Arc<dyn SignalClassifier>> {
        self.cell
            .get_or_init(|| match (self.loader)() {
                Ok(classifier) => {
                    info!(
                        model = classifier.name(),
                        fingerprint = classifier.fingerprint().unwrap_or("-"),
                        "classifier loaded"
                    );
                    Ok(classifier)
                }
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "classifier unavailable; using rule fallback");
                    Err(format!("{e:#}"))
                }
            })
            .as_ref()
            .ok()
            .cloned()
    }

    /// Current state without triggering a load.
    pub fn status(&self) -> ClassifierStatus {
        match self.cell.get() {
            None => ClassifierStatus::NotLoaded,
            Some(Ok(c)) => ClassifierStatus::Ready {
                name: c.name().to_string(),
                fingerprint: c.fingerprint().map(str::to_string),
            },
            Some(Err(reason)) => ClassifierStatus::Unavailable {
                reason: reason.clone(),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Classifier returning a fixed prediction; shared with the engine tests.
    pub(crate) struct FixedClassifier(pub Prediction);

    impl SignalClassifier for FixedClassifier {
        fn predict(&self, _features: &FeatureVector) -> Result<Prediction> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    pub(crate) fn fixed(label: i8, probabilities: &[(i8, f64)]) -> Arc<dyn SignalClassifier> {
        Arc::new(FixedClassifier(Prediction {
            label,
            probabilities: probabilities.to_vec(),
        }))
    }

    #[test]
    fn confidence_is_max_probability() {
        let p = Prediction {
            label: 1,
            probabilities: vec![(-1, 0.1), (0, 0.2), (1, 0.7)],
        };
        assert_eq!(p.confidence().unwrap(), 0.7);
    }

    #[test]
    fn malformed_output_is_an_error() {
        let bad_label = Prediction { label: 3, probabilities: vec![(1, 0.9)] };
        let bad_prob = Prediction { label: 1, probabilities: vec![(1, f64::NAN)] };
        let over_one = Prediction { label: 1, probabilities: vec![(1, 1.5)] };
        let empty = Prediction { label: 0, probabilities: vec![] };
        for p in [bad_label, bad_prob, over_one, empty] {
            assert!(p.confidence().is_err());
        }
    }

    #[test]
    fn status_transitions() {
        let handle = ClassifierHandle::unavailable("no artifact");
        assert_eq!(handle.status(), ClassifierStatus::NotLoaded);
        assert!(handle.get().is_none());
        assert!(matches!(handle.status(), ClassifierStatus::Unavailable { .. }));

        let ready = ClassifierHandle::ready(fixed(0, &[(0, 1.0)]));
        assert!(matches!(ready.status(), ClassifierStatus::Ready { .. }));
        assert!(ready.get().is_some());
    }

    #[test]
    fn failed_load_is_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let handle = ClassifierHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("corrupt artifact")
        });
        assert!(handle.get().is_none());
        assert!(handle.get().is_none());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_use_loads_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let handle = Arc::new(ClassifierHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            Ok(fixed(1, &[(1, 0.9)]))
        }));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let h = handle.clone();
                std::thread::spawn(move || h.get().is_some())
            })
            .collect();
        for t in threads {
            assert!(t.join().unwrap());
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
