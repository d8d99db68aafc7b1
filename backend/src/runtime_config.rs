// =============================================================================
// Advisor Configuration: file-backed settings with atomic save
// =============================================================================
//
// Every tunable value of the advisor lives here: watched symbols, fetch
// window, provider order, classifier artifact, journal, scanner cadence and
// the indicator / decision / target parameter blocks.
//
// Persistence uses an atomic tmp + rename pattern. All fields carry serde
// defaults so that adding new fields never breaks loading an older file.
// Environment variables override the file after loading.
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decision::DecisionParams;
use crate::indicators::IndicatorParams;
use crate::journal::DEFAULT_CAPACITY;
use crate::targets::TargetParams;

pub const DEFAULT_CONFIG_PATH: &str = "advisor_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_symbols() -> Vec<SymbolEntry> {
    [
        ("Sensex", "^BSESN"),
        ("BankNifty", "^NSEBANK"),
        ("Nifty50", "^NSEI"),
        ("CrudeOil", "CL=F"),
    ]
    .into_iter()
    .map(|(name, ticker)| SymbolEntry::new(name, ticker))
    .collect()
}

fn default_period() -> String {
    "1d".to_string()
}

fn default_interval() -> String {
    "5m".to_string()
}

fn default_providers() -> Vec<ProviderKind> {
    vec![ProviderKind::Yahoo]
}

fn default_synthetic_seed() -> u64 {
    42
}

fn default_model_path() -> String {
    "models/signal_forest.json".to_string()
}

fn default_journal_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_scan_interval_secs() -> u64 {
    300
}

// =============================================================================
// Sections
// =============================================================================

/// Display name and data-provider ticker of a watched instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub name: String,
    pub ticker: String,
}

impl SymbolEntry {
    pub fn new(name: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Yahoo,
    Synthetic,
}

/// Background scanner cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Only scan while the Indian cash market is open.
    #[serde(default = "default_true")]
    pub market_hours_only: bool,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_interval_secs: default_scan_interval_secs(),
            market_hours_only: true,
        }
    }
}

/// Journal storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalSettings {
    /// JSON-lines file; `None` keeps the journal in memory only.
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default = "default_journal_capacity")]
    pub capacity: usize,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            path: Some("trading_journal.jsonl".to_string()),
            capacity: default_journal_capacity(),
        }
    }
}

// =============================================================================
// AdvisorConfig
// =============================================================================

/// Top-level configuration for the advisor service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Watched instruments, in display order.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<SymbolEntry>,

    // --- Ingestion ----------------------------------------------------------

    /// Look-back window passed to providers (e.g. "1d", "1y").
    #[serde(default = "default_period")]
    pub period: String,

    /// Bar size (e.g. "5m", "1d").
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Real providers, tried in order.
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderKind>,

    /// Append the synthetic generator as a last resort.
    #[serde(default = "default_true")]
    pub synthetic_fallback: bool,

    #[serde(default = "default_synthetic_seed")]
    pub synthetic_seed: u64,

    // --- Classifier ---------------------------------------------------------

    /// Random-forest artifact (JSON).
    #[serde(default = "default_model_path")]
    pub model_path: String,

    // --- Background work ----------------------------------------------------

    #[serde(default)]
    pub journal: JournalSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,

    // --- Parameter blocks ---------------------------------------------------

    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub decision: DecisionParams,

    #[serde(default)]
    pub targets: TargetParams,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            symbols: default_symbols(),
            period: default_period(),
            interval: default_interval(),
            providers: default_providers(),
            synthetic_fallback: true,
            synthetic_seed: default_synthetic_seed(),
            model_path: default_model_path(),
            journal: JournalSettings::default(),
            scanner: ScannerSettings::default(),
            indicators: IndicatorParams::default(),
            decision: DecisionParams::default(),
            targets: TargetParams::default(),
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read advisor config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse advisor config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = config.symbols.len(),
            interval = %config.interval,
            "advisor config loaded"
        );

        Ok(config)
    }

    /// [`Self::load`], falling back to defaults with a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "using default advisor config");
                Self::default()
            }
        }
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise advisor config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "advisor config saved (atomic)");
        Ok(())
    }

    /// Apply `ADVISOR_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = var("ADVISOR_BIND_ADDR").filter(|s| !s.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
        if let Some(raw) = var("ADVISOR_SYMBOLS") {
            match parse_symbols(&raw) {
                Ok(symbols) => self.symbols = symbols,
                Err(e) => warn!(error = %e, "ignoring ADVISOR_SYMBOLS"),
            }
        }
        if let Some(path) = var("ADVISOR_MODEL_PATH").filter(|s| !s.trim().is_empty()) {
            self.model_path = path.trim().to_string();
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn find_symbol(&self, name: &str) -> Option<&SymbolEntry> {
        self.symbols.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn symbol_names(&self) -> Vec<String> {
        self.symbols.iter().map(|s| s.name.clone()).collect()
    }
}

/// Parse `Name=TICKER,Name=TICKER`.
pub fn parse_symbols(raw: &str) -> Result<Vec<SymbolEntry>> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((name, ticker)) = part.split_once('=') else {
            bail!("expected Name=TICKER, got {part:?}");
        };
        let (name, ticker) = (name.trim(), ticker.trim());
        if name.is_empty() || ticker.is_empty() {
            bail!("expected Name=TICKER, got {part:?}");
        }
        out.push(SymbolEntry::new(name, ticker));
    }
    if out.is_empty() {
        bail!("no symbols given");
    }
    Ok(out)
}

/// Bearer token for protected routes, from `ADVISOR_API_TOKEN`.
pub fn api_token_from_env() -> Option<String> {
    std::env::var("ADVISOR_API_TOKEN")
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = AdvisorConfig::default();
        assert_eq!(cfg.symbols.len(), 4);
        assert_eq!(cfg.symbols[0], SymbolEntry::new("Sensex", "^BSESN"));
        assert_eq!(cfg.symbols[3].ticker, "CL=F");
        assert_eq!(cfg.period, "1d");
        assert_eq!(cfg.interval, "5m");
        assert_eq!(cfg.scanner.scan_interval_secs, 300);
        assert!(cfg.scanner.market_hours_only);
        assert_eq!(cfg.journal.capacity, 500);
        assert_eq!(cfg.decision.confidence_threshold, 0.6);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: AdvisorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AdvisorConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "interval": "15m",
            "decision": { "confidence_threshold": 0.7 },
            "scanner": { "market_hours_only": false }
        }"#;
        let cfg: AdvisorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.interval, "15m");
        assert_eq!(cfg.decision.confidence_threshold, 0.7);
        assert_eq!(cfg.decision.adx_trend_threshold, 25.0);
        assert!(!cfg.scanner.market_hours_only);
        assert_eq!(cfg.scanner.scan_interval_secs, 300);
        assert_eq!(cfg.symbols.len(), 4);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("advisor-config-{}.json", uuid::Uuid::new_v4()));
        let mut cfg = AdvisorConfig::default();
        cfg.targets.normal_target_atr = 3.0;
        cfg.save(&path).unwrap();
        let loaded = AdvisorConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AdvisorConfig::load_or_default("/nonexistent/advisor_config.json");
        assert_eq!(cfg, AdvisorConfig::default());
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ADVISOR_BIND_ADDR", "127.0.0.1:9000"),
            ("ADVISOR_SYMBOLS", "Nifty50=^NSEI, Crude=CL=F"),
            ("ADVISOR_MODEL_PATH", "/opt/model.json"),
        ]);
        let mut cfg = AdvisorConfig::default();
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(
            cfg.symbols,
            vec![SymbolEntry::new("Nifty50", "^NSEI"), SymbolEntry::new("Crude", "CL=F")]
        );
        assert_eq!(cfg.model_path, "/opt/model.json");
    }

    #[test]
    fn malformed_symbol_override_is_ignored() {
        let mut cfg = AdvisorConfig::default();
        cfg.apply_overrides(|k| (k == "ADVISOR_SYMBOLS").then(|| "Sensex".to_string()));
        assert_eq!(cfg.symbols.len(), 4);
    }

    #[test]
    fn symbol_lookup_ignores_case() {
        let cfg = AdvisorConfig::default();
        assert_eq!(cfg.find_symbol("banknifty").unwrap().ticker, "^NSEBANK");
        assert!(cfg.find_symbol("DowJones").is_none());
    }
}
