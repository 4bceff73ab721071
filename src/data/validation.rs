use serde::{Deserialize, Serialize};

/// Outcome of running the external syntax checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxCheck {
    pub success: bool,
    /// Checker diagnostics, verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of the structural lint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicCheck {
    pub success: bool,
    pub issues: Vec<String>,
}

/// Pass/fail verdict for a generated script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub syntax: SyntaxCheck,
    /// `None` when the syntax check failed and the lint was skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heuristics: Option<HeuristicCheck>,
}

impl ValidationResult {
    pub fn from_checks(syntax: SyntaxCheck, heuristics: Option<HeuristicCheck>) -> Self {
        let success = syntax.success && heuristics.as_ref().is_some_and(|h| h.success);
        Self {
            success,
            syntax,
            heuristics,
        }
    }

    /// Every problem found, prefixed by the check that found it.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.syntax.success {
            let error = self
                .syntax
                .error
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .unwrap_or("Unknown syntax error");
            issues.push(format!("Syntax error: {}", error));
        }
        if let Some(heuristics) = &self.heuristics {
            for issue in &heuristics.issues {
                issues.push(format!("Validation issue: {}", issue));
            }
        }
        issues
    }

    /// Human readable analysis of the verdict.
    pub fn summary(&self) -> String {
        if self.success {
            return "The script passed all checks.".to_string();
        }

        let mut issues = self.issues();
        if issues.is_empty() {
            issues.push("The script failed validation for unknown reasons.".to_string());
        }

        if issues.len() == 1 {
            return issues.remove(0);
        }

        let mut summary = String::from("The script has the following issues:\n");
        for (i, issue) in issues.iter().enumerate() {
            summary.push_str(&format!("{}. {}\n", i + 1, issue));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing_syntax() -> SyntaxCheck {
        SyntaxCheck {
            success: true,
            error: None,
        }
    }

    #[test]
    fn test_success_requires_both_checks() {
        let clean = HeuristicCheck {
            success: true,
            issues: vec![],
        };
        assert!(ValidationResult::from_checks(passing_syntax(), Some(clean.clone())).success);
        assert!(!ValidationResult::from_checks(passing_syntax(), None).success);

        let broken = SyntaxCheck {
            success: false,
            error: Some("SyntaxError: Unexpected token".to_string()),
        };
        assert!(!ValidationResult::from_checks(broken, Some(clean)).success);
    }

    #[test]
    fn test_summary_single_issue() {
        let result = ValidationResult::from_checks(
            SyntaxCheck {
                success: false,
                error: Some("SyntaxError: missing ) after argument list\n".to_string()),
            },
            None,
        );
        assert_eq!(
            result.summary(),
            "Syntax error: SyntaxError: missing ) after argument list"
        );
    }

    #[test]
    fn test_summary_numbers_multiple_issues() {
        let result = ValidationResult::from_checks(
            passing_syntax(),
            Some(HeuristicCheck {
                success: false,
                issues: vec!["Missing exports.rule".to_string(), "Missing guard function".to_string()],
            }),
        );
        let summary = result.summary();
        assert!(summary.starts_with("The script has the following issues:"));
        assert!(summary.contains("1. Validation issue: Missing exports.rule"));
        assert!(summary.contains("2. Validation issue: Missing guard function"));
    }
}
