use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use rayon::prelude::*;
use sbatch_lint_core::{
    DiagnosticCollection, Document, FlagDescriptor, LineDiagnostic, Linter, Severity, Span,
};
use sbatch_lint_db::{LintConfig, SchemaDatabase};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// CLI output format with clap argument parsing support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "sbatch-lint", version)]
#[command(about = "Validate #SBATCH directives in Slurm batch scripts")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check batch scripts and report directive problems.
    Check(CheckArgs),
    /// List every recognized flag.
    Flags(FlagsArgs),
    /// Show the names, description and accepted values of one flag.
    Explain(ExplainArgs),
    /// Load the schema tables and report whether they are valid.
    CheckSchema(SchemaArgs),
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// Lint configuration file (default: nearest .sbatch-lint.yml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding flags.json and validators.json; overrides the configuration.
    #[arg(long)]
    schema_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Script files and/or directories to scan recursively.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    #[command(flatten)]
    schema: SchemaArgs,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: CliOutputFormat,
    /// Check every file found in directories, not only configured extensions.
    #[arg(long)]
    all_files: bool,
    /// Number of parallel jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(Debug, Args)]
struct FlagsArgs {
    #[command(flatten)]
    schema: SchemaArgs,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ExplainArgs {
    /// Flag as written in a directive (`--time`, `-t`) or a bare name.
    #[arg(allow_hyphen_values = true)]
    flag: String,
    #[command(flatten)]
    schema: SchemaArgs,
}

/// Diagnostics of one checked file, as emitted by `--format json|yaml`.
#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    diagnostics: Vec<ReportEntry>,
}

#[derive(Debug, Serialize)]
struct ReportEntry {
    line: usize,
    column: usize,
    code: &'static str,
    severity: Severity,
    message: String,
    span: Span,
}

impl From<&LineDiagnostic> for ReportEntry {
    fn from(found: &LineDiagnostic) -> Self {
        let (line, column) = found.position();
        Self {
            line,
            column,
            code: found.diagnostic.rule.code(),
            severity: found.diagnostic.severity,
            message: found.diagnostic.message.clone(),
            span: found.diagnostic.span,
        }
    }
}

#[derive(Debug, Serialize)]
struct FlagSummary {
    long: Option<String>,
    short: Option<String>,
    description: Option<String>,
    accepts: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Flags(args) => run_flags(args),
        Command::Explain(args) => run_explain(args),
        Command::CheckSchema(args) => run_check_schema(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn load_schema(args: &SchemaArgs) -> Result<(LintConfig, SchemaDatabase), String> {
    let config_path = args.config.clone().or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(LintConfig::discover)
    });
    let config = match config_path {
        Some(path) => {
            debug!(path = %path.display(), "Using lint configuration");
            LintConfig::load(&path).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => LintConfig::default(),
    };

    let db = match &args.schema_dir {
        Some(dir) => SchemaDatabase::from_dir(dir).map_err(|e| format!("{}: {e}", dir.display()))?,
        None => config.database().map_err(|e| e.to_string())?,
    };
    info!(source = %db.source(), flags = db.len(), "Schema loaded");
    Ok((config, db))
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let (config, db) = load_schema(&args.schema)?;
    let linter = config.linter(&db).map_err(|e| e.to_string())?;
    let files = collect_scripts(&args.paths, &linter, args.all_files)?;
    debug!(files = files.len(), "Collected scripts");
    // Extension filtering already happened while collecting.
    let linter = linter.with_any_extension();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .map_err(|e| format!("failed to create thread pool: {e}"))?;

    let results: Vec<(PathBuf, Result<Vec<LineDiagnostic>, String>)> = pool.install(|| {
        files
            .par_iter()
            .map(|path| (path.clone(), check_file(&linter, path)))
            .collect()
    });

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (path, result) in results {
        match result {
            Ok(diagnostics) => reports.push((path, diagnostics)),
            Err(err) => failures.push(err),
        }
    }

    match args.format {
        CliOutputFormat::Text => {
            for (path, diagnostics) in &reports {
                for found in diagnostics {
                    println!("{}", format_text(path, found));
                }
            }
        }
        CliOutputFormat::Json | CliOutputFormat::Yaml => {
            let body: Vec<FileReport> = reports
                .iter()
                .map(|(path, diagnostics)| FileReport {
                    path: path.display().to_string(),
                    diagnostics: diagnostics.iter().map(ReportEntry::from).collect(),
                })
                .collect();
            let rendered = if args.format == CliOutputFormat::Json {
                serde_json::to_string_pretty(&body).map_err(|e| e.to_string())?
            } else {
                serde_yaml::to_string(&body).map_err(|e| e.to_string())?
            };
            println!("{rendered}");
        }
    }

    for failure in &failures {
        eprintln!("error: {failure}");
    }

    let errors = reports
        .iter()
        .flat_map(|(_, diagnostics)| diagnostics)
        .filter(|found| found.diagnostic.severity == Severity::Error)
        .count();
    let problem_files = reports
        .iter()
        .filter(|(_, diagnostics)| !diagnostics.is_empty())
        .count();
    eprintln!(
        "Checked {} files: {errors} errors in {problem_files} files",
        reports.len()
    );

    if !failures.is_empty() {
        return Err(format!("{} files could not be read", failures.len()));
    }
    if errors > 0 {
        return Err(format!("{errors} directive errors found"));
    }
    Ok(())
}

fn check_file(linter: &Linter, path: &Path) -> Result<Vec<LineDiagnostic>, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut sink = DiagnosticCollection::new();
    linter.lint(&Document::new(path, text), &mut sink);
    Ok(sink.get(path).map(<[LineDiagnostic]>::to_vec).unwrap_or_default())
}

fn format_text(path: &Path, found: &LineDiagnostic) -> String {
    let (line, column) = found.position();
    format!(
        "{}:{line}:{column}: {}[{}]: {}",
        path.display(),
        found.diagnostic.severity,
        found.diagnostic.rule.code(),
        found.diagnostic.message
    )
}

/// Expands inputs into the list of scripts to check.
///
/// Files named explicitly are always checked. Directories are walked
/// recursively, skipping hidden entries, and only files the linter applies
/// to are kept unless `all_files` is set.
fn collect_scripts(inputs: &[PathBuf], linter: &Linter, all_files: bool) -> Result<Vec<PathBuf>, String> {
    let mut paths = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            walk_dir(input, &mut found).map_err(|e| format!("{}: {e}", input.display()))?;
            paths.extend(
                found
                    .into_iter()
                    .filter(|path| all_files || linter.applies_to(path)),
            );
            continue;
        }

        if input.is_file() {
            paths.insert(input.clone());
            continue;
        }

        return Err(format!("path '{}' does not exist", input.display()));
    }

    Ok(paths.into_iter().collect())
}

fn walk_dir(dir: &Path, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_str().is_some_and(|name| name.starts_with('.'));
        if hidden {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_dir(&entry.path(), found)?;
        } else if file_type.is_file() {
            found.push(entry.path());
        }
    }
    Ok(())
}

fn summarize(db: &SchemaDatabase, flag: &FlagDescriptor) -> FlagSummary {
    FlagSummary {
        long: flag.long.clone(),
        short: flag.short.clone(),
        description: flag.description.clone(),
        accepts: db.schema().expected(&flag.values),
    }
}

fn run_flags(args: FlagsArgs) -> Result<(), String> {
    let (_, db) = load_schema(&args.schema)?;

    match args.format {
        CliOutputFormat::Text => {
            for flag in db.flags() {
                println!(
                    "{:<32} {}",
                    flag.usage(),
                    flag.description.as_deref().unwrap_or("")
                );
            }
        }
        CliOutputFormat::Json => {
            let summaries: Vec<FlagSummary> = db.flags().map(|flag| summarize(&db, flag)).collect();
            let json = serde_json::to_string_pretty(&summaries).map_err(|e| e.to_string())?;
            println!("{json}");
        }
        CliOutputFormat::Yaml => {
            let summaries: Vec<FlagSummary> = db.flags().map(|flag| summarize(&db, flag)).collect();
            let yaml = serde_yaml::to_string(&summaries).map_err(|e| e.to_string())?;
            print!("{yaml}");
        }
    }
    Ok(())
}

fn run_explain(args: ExplainArgs) -> Result<(), String> {
    let (_, db) = load_schema(&args.schema)?;
    let flag = db
        .get(&args.flag)
        .ok_or_else(|| format!("unrecognized flag: {}", args.flag))?;
    let summary = summarize(&db, flag);

    println!("{}", flag.usage());
    if let Some(description) = &summary.description {
        println!("  {description}");
    }
    println!("  accepts: {}", summary.accepts);
    Ok(())
}

fn run_check_schema(args: SchemaArgs) -> Result<(), String> {
    let (_, db) = load_schema(&args)?;
    println!(
        "Schema OK ({}): {} flags, {} validators",
        db.source(),
        db.len(),
        db.schema().validators().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbatch_lint_core::{Diagnostic, DiagnosticSink, Rule};

    fn linter() -> Linter {
        let db = SchemaDatabase::bundled().unwrap();
        LintConfig::default().linter(&db).unwrap()
    }

    #[test]
    fn test_format_text_is_one_based() {
        let found = LineDiagnostic {
            line: 2,
            diagnostic: Diagnostic::new(Rule::UnknownFlag, Span::new(10, 18), "unrecognized flag: walltime"),
        };
        assert_eq!(
            format_text(Path::new("job.sh"), &found),
            "job.sh:3:11: error[unknown-flag]: unrecognized flag: walltime"
        );
    }

    #[test]
    fn test_check_file_publishes_through_sink() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("submit");
        fs::write(&script, "#SBATCH --walltime=1:00:00\r\n#SBATCH --nodes=2\r").unwrap();

        let found = check_file(&linter().with_any_extension(), &script).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 0);
        assert_eq!(found[0].diagnostic.rule, Rule::UnknownFlag);

        let mut sink = DiagnosticCollection::new();
        sink.publish(&script, found);
        linter().lint(&Document::new(&script, ""), &mut sink);
        assert!(sink.get(&script).is_none());
    }

    #[test]
    fn test_collect_scripts_filters_walked_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("jobs");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("a.sh"), "").unwrap();
        fs::write(nested.join("b.sh"), "").unwrap();
        fs::write(nested.join("notes.txt"), "").unwrap();
        fs::write(dir.path().join(".git").join("hook.sh"), "").unwrap();

        let linter = linter();
        let found = collect_scripts(&[dir.path().to_path_buf()], &linter, false).unwrap();
        assert_eq!(found, vec![dir.path().join("a.sh"), nested.join("b.sh")]);

        let all = collect_scripts(&[dir.path().to_path_buf()], &linter, true).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_collect_scripts_keeps_explicit_files() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("job.slurm");
        fs::write(&script, "").unwrap();

        let found = collect_scripts(&[script.clone()], &linter(), false).unwrap();
        assert_eq!(found, vec![script]);
    }

    #[test]
    fn test_collect_scripts_missing_path() {
        let err = collect_scripts(&[PathBuf::from("/nonexistent/job.sh")], &linter(), false)
            .unwrap_err();
        assert!(err.contains("does not exist"));
    }
}
