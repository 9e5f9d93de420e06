//! Turns quality gate verdicts into pass, warn or reject decisions.

use gatehouse_core::{QualityDetection, QualityOutcome};
use gatehouse_interface::QualityVerdict;
use gatehouse_rate_limit::QualitySettings;

/// Threshold policy applied to evaluator verdicts.
///
/// # Examples
///
/// ```
/// use gatehouse_core::QualityOutcome;
/// use gatehouse_gateway::QualityPolicy;
/// use gatehouse_interface::QualityVerdict;
///
/// let policy = QualityPolicy::new(0.6, 0.8, "[QUALITY WARNING] ");
/// let verdict = QualityVerdict { is_severe: false, severity_score: 0.7, issues: vec![] };
/// assert_eq!(policy.judge(&verdict).outcome, QualityOutcome::Warned);
/// ```
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct QualityPolicy {
    warn_threshold: f64,
    severe_threshold: f64,
    warning_prefix: String,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self::from_settings(&QualitySettings::default())
    }
}

impl QualityPolicy {
    /// Create a policy.
    pub fn new(warn_threshold: f64, severe_threshold: f64, warning_prefix: impl Into<String>) -> Self {
        Self {
            warn_threshold,
            severe_threshold,
            warning_prefix: warning_prefix.into(),
        }
    }

    /// Create a policy from quality settings.
    pub fn from_settings(settings: &QualitySettings) -> Self {
        Self::new(
            settings.warn_threshold,
            settings.severe_threshold,
            settings.warning_prefix.clone(),
        )
    }

    /// Classify a verdict.
    ///
    /// The evaluator's own `is_severe` flag or a score at the severe threshold
    /// rejects; a score at the warning threshold warns. A NaN score cannot be
    /// judged and reads as unknown.
    pub fn judge(&self, verdict: &QualityVerdict) -> QualityDetection {
        if verdict.severity_score.is_nan() && !verdict.is_severe {
            return Self::unknown("evaluator returned a NaN severity score");
        }

        let severity = if verdict.severity_score.is_nan() {
            1.0
        } else {
            verdict.severity_score.clamp(0.0, 1.0)
        };

        let outcome = if verdict.is_severe || severity >= self.severe_threshold {
            QualityOutcome::Rejected
        } else if severity >= self.warn_threshold {
            QualityOutcome::Warned
        } else {
            QualityOutcome::Clean
        };

        QualityDetection {
            outcome,
            severity_score: severity,
            issues: verdict.issues.clone(),
        }
    }

    /// Detection recorded when the evaluator could not produce a verdict.
    pub fn unknown(reason: impl std::fmt::Display) -> QualityDetection {
        QualityDetection {
            outcome: QualityOutcome::Unknown,
            severity_score: 0.0,
            issues: vec![format!("quality unknown: {}", reason)],
        }
    }

    /// Prefix warned content with the visible warning.
    pub fn annotate(&self, content: &str) -> String {
        format!("{}{}", self.warning_prefix, content)
    }
}
