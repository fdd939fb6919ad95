//! Risk levels and the probability cut-points that produce them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered severity: LOW < MEDIUM < HIGH < CRITICAL
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// HIGH and CRITICAL raise an alert
    pub fn is_alerting(&self) -> bool {
        *self >= RiskLevel::High
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            other => Err(format!("unknown risk level '{}'", other)),
        }
    }
}

/// Lower bounds (inclusive) of MEDIUM, HIGH and CRITICAL
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskThresholds {
    medium: f64,
    high: f64,
    critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 0.30,
            high: 0.50,
            critical: 0.70,
        }
    }
}

impl RiskThresholds {
    /// Cut-points must be strictly ascending inside [0, 1]
    pub fn new(medium: f64, high: f64, critical: f64) -> Result<Self, String> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !(in_range(medium) && in_range(high) && in_range(critical)) {
            return Err(format!(
                "risk thresholds must lie in [0, 1], got {}/{}/{}",
                medium, high, critical
            ));
        }
        if !(medium < high && high < critical) {
            return Err(format!(
                "risk thresholds must be strictly ascending, got {}/{}/{}",
                medium, high, critical
            ));
        }
        Ok(Self { medium, high, critical })
    }

    pub fn classify(&self, probability: f64) -> RiskLevel {
        if probability >= self.critical {
            RiskLevel::Critical
        } else if probability >= self.high {
            RiskLevel::High
        } else if probability >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

const MONITORING_GUIDANCE: [&str; 2] = ["Monitor conditions closely", "Follow safety protocols"];

const ESCALATION_GUIDANCE: [&str; 2] = [
    "Consider restricting access to high-risk areas",
    "Increase monitoring frequency",
];

/// Baseline statement and monitoring guidance, then model extras, then
/// escalation for alerting levels. Extras already present are dropped.
pub fn compose_recommendations(level: RiskLevel, extras: &[String]) -> Vec<String> {
    let mut out = vec![format!("Current risk level: {}", level)];
    out.extend(MONITORING_GUIDANCE.iter().map(|s| s.to_string()));

    let escalation: &[&str] = if level.is_alerting() { &ESCALATION_GUIDANCE } else { &[] };

    for extra in extras {
        let duplicate = out.contains(extra) || escalation.contains(&extra.as_str());
        if !duplicate {
            out.push(extra.clone());
        }
    }
    out.extend(escalation.iter().map(|s| s.to_string()));
    out
}

/// 0.623 -> "62.3%"
pub fn format_percentage(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        let t = RiskThresholds::default();
        assert_eq!(t.classify(0.0), RiskLevel::Low);
        assert_eq!(t.classify(0.2999), RiskLevel::Low);
        assert_eq!(t.classify(0.30), RiskLevel::Medium);
        assert_eq!(t.classify(0.4999), RiskLevel::Medium);
        assert_eq!(t.classify(0.50), RiskLevel::High);
        assert_eq!(t.classify(0.6999), RiskLevel::High);
        assert_eq!(t.classify(0.70), RiskLevel::Critical);
        assert_eq!(t.classify(1.0), RiskLevel::Critical);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = RiskThresholds::new(0.1, 0.2, 0.9).unwrap();
        assert_eq!(t.classify(0.15), RiskLevel::Medium);
        assert_eq!(t.classify(0.75), RiskLevel::High);
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(RiskThresholds::new(0.5, 0.3, 0.7).is_err());
        assert!(RiskThresholds::new(0.3, 0.3, 0.7).is_err());
        assert!(RiskThresholds::new(0.3, 0.5, 1.2).is_err());
        assert!(RiskThresholds::new(f64::NAN, 0.5, 0.7).is_err());
    }

    #[test]
    fn test_level_ordering_and_parsing() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert!(!RiskLevel::Medium.is_alerting());
        assert!(RiskLevel::High.is_alerting());
        assert_eq!("CRITICAL".parse::<RiskLevel>(), Ok(RiskLevel::Critical));
        assert!("critical".parse::<RiskLevel>().is_err());
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"MEDIUM\"");
    }

    #[test]
    fn test_recommendations_low() {
        let recs = compose_recommendations(RiskLevel::Low, &[]);
        assert_eq!(
            recs,
            vec![
                "Current risk level: LOW",
                "Monitor conditions closely",
                "Follow safety protocols",
            ]
        );
    }

    #[test]
    fn test_recommendations_escalate_for_high() {
        let extras = vec![
            "Inspect bench 4".to_string(),
            "Increase monitoring frequency".to_string(),
        ];
        let recs = compose_recommendations(RiskLevel::Critical, &extras);
        assert_eq!(recs[0], "Current risk level: CRITICAL");
        assert_eq!(recs[3], "Inspect bench 4");
        assert_eq!(&recs[4..], &ESCALATION_GUIDANCE.map(String::from));
        assert_eq!(recs.len(), 6);
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.623), "62.3%");
        assert_eq!(format_percentage(0.75), "75.0%");
        assert_eq!(format_percentage(0.0), "0.0%");
        assert_eq!(format_percentage(1.0), "100.0%");
    }
}
