mod logging;
mod redaction;
mod rows;
mod settings;
mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use namegen_core::{DatabaseSchema, SchemaResolver, TableSchemaResolver, validate_schema};
use namegen_generate::{
    AnalysisResult, BatchOptions, InMemoryLookupResolver, LookupError, NameGenError,
    NameGenerator, Parents, ValidationReport, validate_expression,
};
use namegen_sequence::{SampleCounters, SequenceError, SequenceKey, SequenceManager};
use serde::Serialize;
use thiserror::Error;

use settings::{DEFAULT_SETTINGS_FILE, NamegenSettings, load_settings, save_settings};

#[derive(Debug, Error)]
enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("schema error: {0}")]
    Core(#[from] namegen_core::Error),
    #[error("{0}")]
    Generate(#[from] NameGenError),
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),
    #[error("sequence error: {0}")]
    Sequence(#[from] SequenceError),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Parser, Debug)]
#[command(name = "namegen", version, about = "Name expression generator")]
struct Cli {
    /// Settings file.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Name every row of a CSV or JSON file.
    Generate(GenerateArgs),
    /// Validate an expression and print what it needs, as JSON.
    Analyze(AnalyzeArgs),
    /// Inspect or advance a durable counter.
    #[command(subcommand)]
    Sequence(SequenceCommand),
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Schema snapshot (schema.json) describing the owning table.
    #[arg(long, requires = "table")]
    schema: Option<PathBuf>,
    /// Owning table as `schema.table`.
    #[arg(long, requires = "schema")]
    table: Option<String>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, short = 'e')]
    expression: String,
    /// Input rows (.csv or .json).
    #[arg(long)]
    rows: PathBuf,
    /// Output file; `.json` writes JSON, anything else CSV. Defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    #[command(flatten)]
    schema: SchemaArgs,
    /// Lookup table rows as `schema.table=file.csv`.
    #[arg(long, value_name = "TABLE=FILE")]
    lookup: Vec<String>,
    #[arg(long = "data-parent", value_name = "NAME")]
    data_parents: Vec<String>,
    #[arg(long = "sample-parent", value_name = "NAME")]
    sample_parents: Vec<String>,
    /// Sequence name backing `${genId}`.
    #[arg(long, value_name = "NAME")]
    gen_id: Option<String>,
    #[arg(long, default_value_t = false)]
    skip_duplicates: bool,
    #[arg(long, default_value_t = false)]
    unique_suffix: bool,
    #[arg(long, default_value_t = false)]
    increment_counters: bool,
    /// Seed for random id tokens.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[arg(long, short = 'e')]
    expression: String,
    #[command(flatten)]
    schema: SchemaArgs,
}

#[derive(Args, Debug)]
struct SequenceArgs {
    #[arg(long)]
    name: String,
    /// Defaults to the configured scope.
    #[arg(long)]
    scope: Option<String>,
    #[arg(long, default_value_t = 0)]
    sub_id: i64,
}

#[derive(Subcommand, Debug)]
enum SequenceCommand {
    /// Issue the next value.
    Next(SequenceArgs),
    /// Print the last stored value.
    Current(SequenceArgs),
    /// Raise the stored value to at least `--value`.
    EnsureMin {
        #[command(flatten)]
        key: SequenceArgs,
        #[arg(long)]
        value: i64,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default settings file.
    Init {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    if let Command::Config(ConfigCommand::Init { force }) = cli.command {
        return run_config_init(&cli.config, force);
    }

    let settings = load_settings(&cli.config)?;
    logging::init_logging(&settings.logging)?;

    match cli.command {
        Command::Generate(args) => run_generate(&settings, args),
        Command::Analyze(args) => run_analyze(args),
        Command::Sequence(command) => run_sequence(&settings, command),
        Command::Config(_) => Ok(()),
    }
}

fn run_config_init(path: &std::path::Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::InvalidConfig(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    save_settings(path, &NamegenSettings::default())?;
    println!("{}", path.display());
    Ok(())
}

fn run_generate(settings: &NamegenSettings, args: GenerateArgs) -> Result<(), CliError> {
    let timer = Instant::now();
    let store = store::open_store(&settings.store)?;
    let manager = Arc::new(SequenceManager::new(store, settings.sequences.block_size));
    let scope = settings.sequences.scope.clone();

    let mut builder = NameGenerator::builder(args.expression.as_str())
        .sample_counters(SampleCounters::new(Arc::clone(&manager), scope.clone()))
        .sequences(Arc::clone(&manager))
        .counter_scope(scope.clone())
        .counter_prefix(settings.sequences.counter_prefix.clone());

    if let Some((snapshot, schema_name, table_name)) = load_schema(&args.schema)? {
        let resolver = TableSchemaResolver::new(&snapshot, &schema_name, &table_name)?;
        builder = builder.schema(Arc::new(resolver));
        if !args.lookup.is_empty() {
            builder = builder.lookup_resolver(Arc::new(load_lookups(&snapshot, &args.lookup)?));
        }
    } else if !args.lookup.is_empty() {
        return Err(CliError::InvalidConfig(
            "--lookup needs --schema and --table".to_string(),
        ));
    }
    if let Some(name) = &args.gen_id {
        builder = builder.gen_id(manager.get(&SequenceKey::new(scope.clone(), name.clone()))?);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let generator = builder.build()?;

    let mut rows = rows::read_rows(&args.rows)?;
    let total = rows.len();
    let parents = Parents::new(args.data_parents, args.sample_parents);
    let options = BatchOptions {
        skip_duplicates: args.skip_duplicates,
        add_unique_suffix: args.unique_suffix,
        increment_counters: args.increment_counters,
    };
    let outcome = generator.generate_names(&mut rows, &parents, options);
    manager.sync_all()?;
    outcome?;

    rows::write_rows(args.out.as_deref(), &rows)?;
    tracing::info!(
        event = "generate_finished",
        rows = total,
        named = rows.len(),
        duration_ms = timer.elapsed().as_millis()
    );
    Ok(())
}

/// Output of `namegen analyze`.
#[derive(Debug, Serialize)]
struct AnalyzeReport {
    /// Absent when the expression cannot be analyzed; see `validation.errors`.
    analysis: Option<AnalysisResult>,
    validation: ValidationReport,
}

fn analyze_report(expression: &str, schema: Option<&dyn SchemaResolver>) -> AnalyzeReport {
    let validation = validate_expression(expression, schema);
    let analysis = namegen_expr::parse(expression)
        .ok()
        .and_then(|parsed| namegen_generate::analyze(&parsed, schema).ok());
    AnalyzeReport {
        analysis,
        validation,
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), CliError> {
    let resolver = match load_schema(&args.schema)? {
        Some((snapshot, schema_name, table_name)) => Some(TableSchemaResolver::new(
            &snapshot,
            &schema_name,
            &table_name,
        )?),
        None => None,
    };
    let schema = resolver.as_ref().map(|resolver| resolver as &dyn SchemaResolver);
    let report = analyze_report(&args.expression, schema);
    println!("{}", serde_json::to_string_pretty(&report)?);

    let errors = report.validation.errors.len();
    tracing::info!(
        event = "analyze_finished",
        errors,
        warnings = report.validation.warnings.len()
    );
    if errors > 0 {
        return Err(CliError::InvalidInput(format!("expression has {errors} error(s)")));
    }
    Ok(())
}

fn run_sequence(settings: &NamegenSettings, command: SequenceCommand) -> Result<(), CliError> {
    let store = store::open_store(&settings.store)?;
    let manager = SequenceManager::new(store, settings.sequences.block_size);
    let key = |args: &SequenceArgs| {
        SequenceKey::new(
            args.scope.clone().unwrap_or_else(|| settings.sequences.scope.clone()),
            args.name.clone(),
        )
        .with_sub_id(args.sub_id)
    };

    let value = match &command {
        SequenceCommand::Next(args) => manager.get_unbuffered(&key(args))?.next()?,
        SequenceCommand::Current(args) => manager.store().current(&key(args))?,
        SequenceCommand::EnsureMin { key: args, value } => {
            manager.store().ensure_minimum(&key(args), *value)?
        }
    };
    println!("{value}");
    Ok(())
}

fn load_schema(args: &SchemaArgs) -> Result<Option<(DatabaseSchema, String, String)>, CliError> {
    let (Some(path), Some(table)) = (&args.schema, &args.table) else {
        return Ok(None);
    };
    let snapshot: DatabaseSchema = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    validate_schema(&snapshot)?;
    let (schema_name, table_name) = split_qualified(table)?;
    Ok(Some((snapshot, schema_name, table_name)))
}

fn load_lookups(
    snapshot: &DatabaseSchema,
    specs: &[String],
) -> Result<InMemoryLookupResolver, CliError> {
    let lookups = InMemoryLookupResolver::new();
    for spec in specs {
        let (qualified, path) = spec.split_once('=').ok_or_else(|| {
            CliError::InvalidConfig(format!("lookup must be TABLE=FILE, got '{spec}'"))
        })?;
        let (schema_name, table_name) = split_qualified(qualified)?;
        let table = snapshot.table(&schema_name, &table_name).ok_or_else(|| {
            CliError::InvalidConfig(format!("lookup table not in schema: {qualified}"))
        })?;
        let rows = rows::read_rows(std::path::Path::new(path))?;
        let indexed = lookups.ingest_table(&schema_name, table, &rows)?;
        tracing::info!(event = "lookup_loaded", table = %qualified, rows = indexed);
    }
    Ok(lookups)
}

fn split_qualified(name: &str) -> Result<(String, String), CliError> {
    match name.split_once('.') {
        Some((schema, table)) if !schema.is_empty() && !table.is_empty() => {
            Ok((schema.to_string(), table.to_string()))
        }
        _ => Err(CliError::InvalidConfig(format!(
            "expected schema.table, got '{name}'"
        ))),
    }
}
