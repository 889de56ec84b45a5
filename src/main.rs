use xmt_mutator::coverage::CoverageReport;
use xmt_mutator::filter::CoverageFilter;
use xmt_mutator::output;
use xmt_mutator::registry::OperatorRegistry;
use xmt_mutator::runner;
use xmt_mutator::state::{JsonWorkStore, WorkStore};

use std::path::{Path, PathBuf};
use std::process;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "xmt-mutator", version, about = "Extreme mutation operator and coverage filter for Python")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark pending jobs whose mutated region no test executed as skipped
    Filter {
        /// coverage.json path (created by pytest --cov=src --cov-report=json:coverage.json)
        coverage_json: Option<PathBuf>,
        /// Session file holding the pending jobs
        #[arg(short, long, env = "XMT_SESSION", default_value = "session.json")]
        session: PathBuf,
        /// Operator name prefix of the supported operator family
        #[arg(long, env = "XMT_OPERATOR_PREFIX", default_value = "cr_xmt/")]
        operator_prefix: String,
        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Discover mutations in a module and add them to the session as pending jobs
    Init {
        /// Python module to scan
        file: PathBuf,
        /// Session file to create or extend
        #[arg(short, long, env = "XMT_SESSION", default_value = "session.json")]
        session: PathBuf,
        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Print a module with one mutation applied
    Mutate {
        /// Python module to mutate
        file: PathBuf,
        /// Occurrence of the operator within the module
        #[arg(short = 'n', long, default_value = "0")]
        occurrence: usize,
        /// Qualified operator name
        #[arg(short, long, default_value = "cr_xmt/xmt/function-return")]
        operator: String,
        /// Print a diff instead of the mutated source
        #[arg(long)]
        diff: bool,
    },
    /// List registered operators with their examples
    Operators {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let registry = OperatorRegistry::builtin();

    let exit_code = match cli.command {
        Commands::Filter {
            coverage_json,
            session,
            operator_prefix,
            json,
        } => cmd_filter(coverage_json.as_deref(), &session, operator_prefix, json),
        Commands::Init { file, session, json } => cmd_init(&file, &session, &registry, json),
        Commands::Mutate {
            file,
            occurrence,
            operator,
            diff,
        } => cmd_mutate(&file, occurrence, operator, diff, &registry),
        Commands::Operators { json } => cmd_operators(&registry, json),
    };

    process::exit(exit_code);
}

fn exit_code_for(err: &xmt_mutator::Error) -> i32 {
    if err.is_not_found() { 2 } else { 3 }
}

fn cmd_filter(coverage_json: Option<&Path>, session: &Path, operator_prefix: String, json_mode: bool) -> i32 {
    // Load the report before touching the session so a bad report changes nothing.
    let coverage = match load_coverage(coverage_json) {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&e.to_string());
            return exit_code_for(&e);
        }
    };

    let mut store = match JsonWorkStore::open(session) {
        Ok(s) => s,
        Err(e) => {
            output::print_error(&format!("{e}. Run `xmt-mutator init` first."));
            return exit_code_for(&e);
        }
    };

    let filter = CoverageFilter::new(operator_prefix);
    let report = match filter.apply(&mut store, &coverage) {
        Ok(r) => r,
        Err(e) => {
            output::print_error(&e.to_string());
            return 3;
        }
    };

    if json_mode {
        let summary = FilterSummary {
            kept: &report.kept,
            skipped: report.skipped.iter().map(|s| s.job_id.as_str()).collect(),
        };
        print_json(&summary);
    } else {
        output::print_filter_report(&report, session);
    }
    0
}

fn load_coverage(coverage_json: Option<&Path>) -> xmt_mutator::Result<CoverageReport> {
    match coverage_json {
        Some(path) if !path.as_os_str().is_empty() => CoverageReport::load(path),
        _ => Err(xmt_mutator::Error::MissingInput("coverage_json")),
    }
}

#[derive(Serialize)]
struct FilterSummary<'a> {
    kept: &'a [String],
    skipped: Vec<&'a str>,
}

fn cmd_init(file: &Path, session: &Path, registry: &OperatorRegistry, json_mode: bool) -> i32 {
    if !xmt_mutator::is_python_source(file) {
        output::print_error(&format!("Unsupported file type: {}. Supported: .py", file.display()));
        return 2;
    }
    let (source, module_path) = match read_module(file) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let mutations = match runner::discover_mutations(&source, &module_path, registry) {
        Ok(m) => m,
        Err(e) => {
            output::print_error(&e.to_string());
            return 3;
        }
    };

    let mut store = match JsonWorkStore::open_or_create(session) {
        Ok(s) => s,
        Err(e) => {
            output::print_error(&e.to_string());
            return exit_code_for(&e);
        }
    };
    if let Err(e) = store.add_work_items(runner::init_work_items(mutations.clone())) {
        output::print_error(&e.to_string());
        return 3;
    }

    if json_mode {
        print_json(&mutations);
    } else {
        output::print_mutations(&mutations, file);
    }
    0
}

fn cmd_mutate(file: &Path, occurrence: usize, operator: String, diff: bool, registry: &OperatorRegistry) -> i32 {
    let (source, module_path) = match read_module(file) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let mutated = match runner::apply_occurrence(&source, &operator, occurrence, &module_path, registry) {
        Ok((m, _)) => m,
        Err(e) => {
            output::print_error(&e.to_string());
            return 2;
        }
    };

    if diff {
        output::print_diff(&runner::generate_diff(&source, &mutated));
    } else {
        print!("{mutated}");
    }
    0
}

fn cmd_operators(registry: &OperatorRegistry, json_mode: bool) -> i32 {
    if json_mode {
        let listing: Vec<OperatorListing> = registry
            .iter()
            .map(|(name, op)| OperatorListing {
                name,
                examples: op.examples().iter().map(|e| (e.source, e.mutated)).collect(),
            })
            .collect();
        print_json(&listing);
    } else {
        output::print_operators(registry);
    }
    0
}

#[derive(Serialize)]
struct OperatorListing<'a> {
    name: &'a str,
    examples: Vec<(&'static str, &'static str)>,
}

fn read_module(file: &Path) -> Result<(String, Utf8PathBuf), i32> {
    if !file.exists() {
        output::print_error(&format!(
            "Source file not found: {}. Check the path and try again.",
            file.display()
        ));
        return Err(2);
    }
    let module_path = match Utf8PathBuf::from_path_buf(file.to_path_buf()) {
        Ok(p) => p,
        Err(p) => {
            output::print_error(&format!("Path is not valid UTF-8: {}", p.display()));
            return Err(2);
        }
    };
    match std::fs::read_to_string(file) {
        Ok(s) => Ok((s, module_path)),
        Err(e) => {
            output::print_error(&format!("Failed to read {}: {}", file.display(), e));
            Err(3)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{json}"),
        Err(e) => output::print_error(&format!("Failed to serialize output: {e}")),
    }
}
