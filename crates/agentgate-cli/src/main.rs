//! agentgate - code governance and risk gating CLI
//!
//! The `agentgate` command assesses a candidate source file and exits with
//! the deployment verdict.
//!
//! ## Commands
//!
//! - `assess`: Score, classify and gate one candidate
//! - `history`: Show frequently rejected issue kinds
//! - `record`: Record a manual approval or rejection
//! - `compact`: Rewrite the approval history file
//! - `audit prune`: Drop audit records past the retention window
//!
//! ## Exit codes
//!
//! `0` approved, `1` rejected (low quality or denied), `2` blocked
//! (critical risk), `3` invalid configuration or invocation.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::{info, warn, Level};

use agentgate_core::{
    AssessmentReportArtifact, AuditEvent, AuditLog, AuditRecord, Candidate, CompleteAssessment,
    GovernanceConfig, PatternLearningStore, Pipeline, RiskLevel, EXIT_CONFIG_ERROR,
};

#[derive(Parser)]
#[command(name = "agentgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Code governance and risk gating for agent-generated code", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Governance configuration document (JSON or TOML)
    #[arg(
        short,
        long,
        global = true,
        env = "AGENTGATE_CONFIG",
        default_value = "agentgate.json"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a candidate source file and gate its deployment
    #[command(group(ArgGroup::new("decision").args(["approve", "deny"])))]
    Assess {
        /// Candidate source file
        file: PathBuf,

        /// Candidate identifier (default: file stem)
        #[arg(long)]
        name: Option<String>,

        /// Approve without prompting when human approval is required
        #[arg(long)]
        approve: bool,

        /// Deny without prompting
        #[arg(long)]
        deny: bool,

        /// Reviewer recorded with the decision
        #[arg(long, env = "AGENTGATE_REVIEWER")]
        reviewer: Option<String>,

        /// Never prompt; an unanswered approval counts as rejected
        #[arg(long)]
        non_interactive: bool,

        /// Write the full assessment as JSON
        #[arg(long)]
        report_json: Option<PathBuf>,

        /// Write a markdown summary
        #[arg(long)]
        report_md: Option<PathBuf>,
    },

    /// Show frequently rejected issue kinds and history totals
    History {
        /// Number of issue kinds to list
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Record a manual approval decision
    #[command(group(ArgGroup::new("verdict").required(true).args(["approved", "rejected"])))]
    Record {
        /// Candidate identifier
        #[arg(long)]
        candidate: String,

        #[arg(long)]
        approved: bool,

        #[arg(long)]
        rejected: bool,

        #[arg(long, env = "AGENTGATE_REVIEWER")]
        reviewer: Option<String>,
    },

    /// Rewrite the approval history file atomically
    Compact,

    /// Manage the audit log
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },
}

#[derive(Subcommand)]
enum AuditAction {
    /// Drop records older than RiskPolicy.AuditRetentionYears
    Prune,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    agentgate_core::telemetry::init_tracing(cli.json, level);

    match run(cli).await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Assess {
            file,
            name,
            approve,
            deny,
            reviewer,
            non_interactive,
            report_json,
            report_md,
        } => {
            let override_decision = match (approve, deny) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let opts = AssessOptions {
                name,
                override_decision,
                reviewer,
                interactive: !non_interactive,
                report_json,
                report_md,
            };
            let stdin = std::io::stdin();
            cmd_assess(config, &file, opts, &mut stdin.lock(), &mut std::io::stdout()).await
        }
        Commands::History { limit } => cmd_history(&config, limit).map(|()| 0),
        Commands::Record {
            candidate,
            approved,
            rejected: _,
            reviewer,
        } => cmd_record(&config, &candidate, approved, reviewer.as_deref()).map(|()| 0),
        Commands::Compact => cmd_compact(&config).map(|()| 0),
        Commands::Audit { action } => match action {
            AuditAction::Prune => cmd_audit_prune(&config).map(|()| 0),
        },
    }
}

fn load_config(path: &Path) -> Result<GovernanceConfig> {
    GovernanceConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {:?}", path))
}

struct AssessOptions {
    name: Option<String>,
    override_decision: Option<bool>,
    reviewer: Option<String>,
    interactive: bool,
    report_json: Option<PathBuf>,
    report_md: Option<PathBuf>,
}

/// Assess one candidate and return the process exit code.
async fn cmd_assess(
    config: GovernanceConfig,
    file: &Path,
    opts: AssessOptions,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<i32> {
    let candidate = Candidate::from_path(file, opts.name.as_deref())
        .with_context(|| format!("Failed to read candidate {:?}", file))?;
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;

    let mut assessment = pipeline.assess(&candidate).await;
    print_assessment(out, &assessment)?;

    let blocked = assessment.risk.level == RiskLevel::Critical;
    let decision = match opts.override_decision {
        Some(d) if assessment.approval_required && !blocked => Some(d),
        Some(_) => {
            let reason = if blocked {
                "candidate is blocked"
            } else {
                "no approval is required"
            };
            warn!(candidate = %assessment.candidate, reason, "ignoring --approve/--deny");
            writeln!(out, "warning: ignoring --approve/--deny: {reason}")?;
            None
        }
        None if assessment.approval_required && !blocked && opts.interactive => {
            match prompt_approval(input, out, &assessment.candidate) {
                Ok(answer) => answer,
                Err(e) => {
                    warn!(error = %e, "approval prompt failed");
                    None
                }
            }
        }
        None => None,
    };

    if let Some(approved) = decision {
        if let Err(e) = pipeline.record_decision(&assessment, approved, opts.reviewer.as_deref()) {
            warn!(candidate = %assessment.candidate, error = %e, "failed to record approval decision");
            writeln!(out, "  warning: decision not recorded: {e}")?;
            assessment.errors.push(format!("decision record: {e}"));
        }
    }

    if let Some(path) = &opts.report_json {
        let artifact = AssessmentReportArtifact::new(&assessment, chrono::Utc::now());
        if let Err(e) = agentgate_core::write_assessment_json(path, &artifact) {
            warn!(error = %e, "failed to write JSON report");
            writeln!(out, "  warning: {e:#}")?;
        }
    }
    if let Some(path) = &opts.report_md {
        if let Err(e) = agentgate_core::write_assessment_md(path, &assessment) {
            warn!(error = %e, "failed to write markdown report");
            writeln!(out, "  warning: {e:#}")?;
        }
    }

    let code = assessment.final_exit_code(decision, pipeline.quality_threshold());
    info!(candidate = %assessment.candidate, exit_code = code, "assessment complete");
    writeln!(out, "exit code: {code}")?;
    Ok(code)
}

fn print_assessment(out: &mut impl Write, a: &CompleteAssessment) -> Result<()> {
    writeln!(out, "{}", a.summary)?;
    writeln!(
        out,
        "  quality: overall {:.1} (semantic {:.1}, pattern {:.1}, dependency {:.1}, architecture {:.1})",
        a.validation.overall_quality,
        a.validation.semantic,
        a.validation.pattern,
        a.validation.dependency,
        a.validation.architecture
    )?;
    writeln!(
        out,
        "  risk: {} (category {}); security {:.1}, compliance {:.1}",
        a.risk.level, a.risk.category, a.risk.security_risk, a.risk.compliance_risk
    )?;
    writeln!(out, "  {}", a.risk.justification)?;
    for issue in &a.validation.issues {
        writeln!(out, "  {issue}")?;
    }
    for error in &a.errors {
        writeln!(out, "  warning: {error}")?;
    }
    Ok(())
}

/// Ask for a yes/no answer. `None` when input ends or stays unintelligible.
fn prompt_approval(
    input: &mut impl BufRead,
    out: &mut impl Write,
    candidate: &str,
) -> Result<Option<bool>> {
    for _ in 0..3 {
        write!(out, "Approve deployment of {candidate}? [y/n] ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(Some(true)),
            "n" | "no" => return Ok(Some(false)),
            _ => writeln!(out, "Please answer 'y' or 'n'.")?,
        }
    }
    Ok(None)
}

fn open_store(config: &GovernanceConfig) -> Result<PatternLearningStore> {
    let store = PatternLearningStore::open(
        config.approval_history_path.clone(),
        config.learning.clone(),
    );
    store
        .load()
        .with_context(|| format!("Failed to load history {:?}", store.path()))?;
    Ok(store)
}

fn cmd_history(config: &GovernanceConfig, limit: usize) -> Result<()> {
    let store = open_store(config)?;
    let stats = store.stats();
    println!(
        "records: {} (approved {}, rejected {}) across {} candidate(s)",
        stats.total, stats.approved, stats.rejected, stats.distinct_candidates
    );

    let frequent = store.frequent_rejections(limit);
    if frequent.is_empty() {
        println!("No rejected issue kinds recorded");
        return Ok(());
    }
    println!("Most frequently rejected issue kinds:");
    for (kind, count) in frequent {
        println!("  {:<20} {}", kind.to_string(), count);
    }
    Ok(())
}

fn cmd_record(
    config: &GovernanceConfig,
    candidate: &str,
    approved: bool,
    reviewer: Option<&str>,
) -> Result<()> {
    let store = open_store(config)?;
    store
        .record(candidate, approved, reviewer, Vec::new())
        .context("Failed to record decision")?;

    if let Some(path) = &config.audit_log_path {
        let entry = AuditRecord::new(
            candidate,
            AuditEvent::HumanDecision {
                approved,
                reviewer: reviewer.map(str::to_string),
            },
            config.risk_policy.accountable_officer.as_deref(),
            chrono::Utc::now(),
        );
        AuditLog::open(path.clone())
            .append(&entry)
            .context("Failed to append audit record")?;
    }

    println!(
        "Recorded {} for {}",
        if approved { "approval" } else { "rejection" },
        candidate
    );
    Ok(())
}

fn cmd_compact(config: &GovernanceConfig) -> Result<()> {
    let store = open_store(config)?;
    let written = store.compact().context("Failed to compact history")?;
    println!("Compacted {:?}: {} record(s)", store.path(), written);
    Ok(())
}

fn cmd_audit_prune(config: &GovernanceConfig) -> Result<()> {
    let path = config
        .audit_log_path
        .clone()
        .context("AuditLogPath is not configured")?;
    let years = config.risk_policy.audit_retention_years;
    let removed = AuditLog::open(path.clone())
        .prune(years, chrono::Utc::now())
        .with_context(|| format!("Failed to prune audit log {:?}", path))?;
    println!("Pruned {} audit record(s) older than {} year(s)", removed, years);
    Ok(())
}
