//! Findings produced by analyzers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Score deduction applied by every analyzer for one finding of this severity.
    pub fn penalty(self) -> f64 {
        match self {
            Self::Info => 0.0,
            Self::Low => 2.0,
            Self::Medium => 5.0,
            Self::High => 10.0,
            Self::Critical => 20.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    NamingConvention,
    Complexity,
    MethodLength,
    MagicLiteral,
    Documentation,
    Architecture,
    Dependency,
    Pattern,
    /// The candidate could not be parsed at all.
    Unparsable,
    /// A pipeline stage failed or timed out.
    Pipeline,
}

impl IssueKind {
    /// Kinds whose signatures can be re-checked against a new candidate.
    pub const LEARNABLE: [IssueKind; 7] = [
        IssueKind::NamingConvention,
        IssueKind::Complexity,
        IssueKind::MethodLength,
        IssueKind::MagicLiteral,
        IssueKind::Documentation,
        IssueKind::Architecture,
        IssueKind::Dependency,
    ];

    pub fn is_learnable(self) -> bool {
        Self::LEARNABLE.contains(&self)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NamingConvention => "naming_convention",
            Self::Complexity => "complexity",
            Self::MethodLength => "method_length",
            Self::MagicLiteral => "magic_literal",
            Self::Documentation => "documentation",
            Self::Architecture => "architecture",
            Self::Dependency => "dependency",
            Self::Pattern => "pattern",
            Self::Unparsable => "unparsable",
            Self::Pipeline => "pipeline",
        };
        f.write_str(s)
    }
}

/// The analyzer (or pipeline stage) a finding is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerCategory {
    Semantic,
    Pattern,
    Dependency,
    Architecture,
    Pipeline,
}

impl fmt::Display for AnalyzerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantic => write!(f, "semantic"),
            Self::Pattern => write!(f, "pattern"),
            Self::Dependency => write!(f, "dependency"),
            Self::Architecture => write!(f, "architecture"),
            Self::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Where a finding points in the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: Option<u32>,
    /// Enclosing declaration, e.g. `OrderAgent.Execute`.
    pub symbol: Option<String>,
}

impl Location {
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            symbol: None,
        }
    }

    pub fn at(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            symbol: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        if let Some(symbol) = &self.symbol {
            write!(f, " ({symbol})")?;
        }
        Ok(())
    }
}

/// A single, immutable analyzer finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub category: AnalyzerCategory,
    pub message: String,
    pub location: Location,
}

impl CodeIssue {
    pub fn new(
        category: AnalyzerCategory,
        kind: IssueKind,
        severity: Severity,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            severity,
            kind,
            category,
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for CodeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}/{} {}: {}",
            self.severity, self.category, self.kind, self.location, self.message
        )
    }
}
