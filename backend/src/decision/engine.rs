// =============================================================================
// Decision engine: classifier call, confidence veto, rule fallback
// =============================================================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::classifier::ClassifierHandle;
use super::features::FeatureVector;
use crate::types::Action;

/// Named thresholds used by the engine and the trend counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionParams {
    /// Classifier confidence below this forces hold.
    pub confidence_threshold: f64,
    /// ADX level counted as a trending market.
    pub adx_trend_threshold: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Confidence reported for a rule-based hold. A rule-based buy or sell
    /// reports at least `confidence_threshold`.
    pub fallback_confidence: f64,
}

impl Default for DecisionParams {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            adx_trend_threshold: 25.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            fallback_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Classifier,
    RuleFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub action: Action,
    /// In [0, 1].
    pub confidence: f64,
    pub source: DecisionSource,
    /// Raw classifier label, before the confidence veto.
    pub label: Option<i8>,
}

#[derive(Clone)]
pub struct DecisionEngine {
    classifier: Arc<ClassifierHandle>,
    params: DecisionParams,
}

impl DecisionEngine {
    pub fn new(classifier: Arc<ClassifierHandle>, params: DecisionParams) -> Self {
        Self { classifier, params }
    }

    pub fn params(&self) -> &DecisionParams {
        &self.params
    }

    /// Classify `features`; never fails.
    ///
    /// Any classifier problem (load failure, inference error, malformed
    /// output) is logged and answered by [`Self::fallback`].
    pub fn decide(&self, features: &FeatureVector) -> Decision {
        let Some(classifier) = self.classifier.get() else {
            return self.fallback(features);
        };

        let outcome = classifier
            .predict(features)
            .and_then(|p| p.confidence().map(|c| (p.label, c)));

        match outcome {
            Ok((label, confidence)) => {
                let action = if confidence < self.params.confidence_threshold {
                    Action::Hold
                } else {
                    Action::from_label(label)
                };
                debug!(label, confidence, %action, "classifier decision");
                Decision {
                    action,
                    confidence,
                    source: DecisionSource::Classifier,
                    label: Some(label),
                }
            }
            Err(e) => {
                warn!(model = classifier.name(), error = %format!("{e:#}"), "classifier inference failed; using rule fallback");
                self.fallback(features)
            }
        }
    }

    /// Rule-based decision from RSI and MACD alone.
    ///
    /// A directional call never reports less than the veto threshold, so
    /// `confidence < confidence_threshold` implies hold on this path too.
    pub fn fallback(&self, features: &FeatureVector) -> Decision {
        let action = if features.rsi < self.params.rsi_oversold && features.macd > 0.0 {
            Action::Buy
        } else if features.rsi > self.params.rsi_overbought && features.macd < 0.0 {
            Action::Sell
        } else {
            Action::Hold
        };
        let confidence = match action {
            Action::Hold => self.params.fallback_confidence,
            Action::Buy | Action::Sell => self.params.fallback_confidence.max(self.params.confidence_threshold),
        };
        Decision {
            action,
            confidence: confidence.clamp(0.0, 1.0),
            source: DecisionSource::RuleFallback,
            label: None,
        }
    }
}
