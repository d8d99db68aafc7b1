// =============================================================================
// Shared types used across the advisor
// =============================================================================

use serde::{Deserialize, Serialize};

/// Recommendation produced by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Default for Action {
    fn default() -> Self {
        Self::Hold
    }
}

impl Action {
    /// Map a classifier label (-1 / 0 / 1) to an action. Any other label is
    /// treated as hold.
    pub fn from_label(label: i8) -> Self {
        match label {
            1 => Self::Buy,
            -1 => Self::Sell,
            _ => Self::Hold,
        }
    }

    /// Upper-case form used by the presentation layer ("BUY", "SELL", "HOLD").
    pub fn as_upper(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
            Self::Hold => write!(f, "hold"),
        }
    }
}

/// Option contract side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionKind {
    #[serde(rename = "CALL")]
    Call,
    #[serde(rename = "PUT")]
    Put,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_mapping() {
        assert_eq!(Action::from_label(1), Action::Buy);
        assert_eq!(Action::from_label(-1), Action::Sell);
        assert_eq!(Action::from_label(0), Action::Hold);
        assert_eq!(Action::from_label(7), Action::Hold);
    }

    #[test]
    fn action_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Action::Buy).unwrap(), "\"buy\"");
        assert_eq!(Action::Sell.as_upper(), "SELL");
    }

    #[test]
    fn option_kind_serialises_upper() {
        assert_eq!(serde_json::to_string(&OptionKind::Put).unwrap(), "\"PUT\"");
    }
}
