use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use nerconv::config::{DEV_IDS, NAMES_LIST, TEST_IDS, TRAIN_IDS};
use nerconv::corpus::{list_document_ids, write_id_list};
use nerconv::{
    convert_legacy_file, AllowlistSet, ConversionConfig, Converter, ListPaths, WalkConfig,
};
use rayon::ThreadPoolBuilder;
use serde_json::json;

const DEFAULT_LISTS_DIR: &str = "data/sequenceLabelling/CoNLL-2012-NER";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Named Entity Recognizer dataset converter to IOB2 tagging scheme",
    long_about = None
)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an OntoNotes CoNLL-2012 tree into eng.train / eng.dev / eng.test
    #[command(alias = "conll2012")]
    Ontonotes(OntonotesArgs),
    /// Upgrade a CoNLL-2003 file from IOB1 to IOB2
    Conll2003(Conll2003Args),
    /// List the documents carrying name annotation in an OntoNotes release
    Names(NamesArgs),
}

#[derive(Args, Debug)]
struct OntonotesArgs {
    /// Root directory of the CoNLL-2012 data
    input: PathBuf,

    /// Directory receiving the partition files
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// Directory holding names.list and the split document-id lists
    #[arg(long, value_name = "DIR", default_value = DEFAULT_LISTS_DIR)]
    lists_dir: PathBuf,

    /// Override the named-document list
    #[arg(long, value_name = "PATH")]
    names_list: Option<PathBuf>,

    /// Override the train document-id list
    #[arg(long, value_name = "PATH")]
    train_ids: Option<PathBuf>,

    /// Override the development document-id list
    #[arg(long, value_name = "PATH")]
    dev_ids: Option<PathBuf>,

    /// Override the test document-id list
    #[arg(long, value_name = "PATH")]
    test_ids: Option<PathBuf>,

    /// Fail on the first malformed line or irregular span instead of counting it
    #[arg(long)]
    strict: bool,

    /// Append to existing partition files instead of truncating them
    #[arg(long)]
    append: bool,

    /// Documents converted in parallel per batch
    #[arg(long, value_name = "COUNT")]
    batch_size: Option<usize>,

    /// Limit Rayon worker threads
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Follow symlinks during traversal
    #[arg(long)]
    follow_symlinks: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct Conll2003Args {
    /// CoNLL-2003 file to convert (e.g. eng.train)
    input: PathBuf,

    /// Output file
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,

    /// Fail on the first malformed line instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct NamesArgs {
    /// Root directory of the OntoNotes release
    input: PathBuf,

    /// Directory receiving names.list
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// Follow symlinks during traversal
    #[arg(long)]
    follow_symlinks: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Ontonotes(args) => run_ontonotes(args),
        Commands::Conll2003(args) => run_conll2003(args),
        Commands::Names(args) => run_names(args),
    }
}

/// Level forced by `-v`/`-q`; `None` leaves the decision to `RUST_LOG`. Quiet wins over verbose.
fn flag_level(verbose: u8, quiet: u8) -> Option<LevelFilter> {
    match (quiet, verbose) {
        (0, 0) => None,
        (1, _) => Some(LevelFilter::Warn),
        (q, _) if q > 1 => Some(LevelFilter::Error),
        (_, 1) => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    if let Some(level) = flag_level(verbose, quiet) {
        builder.filter_level(level);
    }
    let _ = builder.try_init();
}

fn run_ontonotes(args: OntonotesArgs) -> Result<()> {
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("unable to configure Rayon thread pool")?;
    }

    let lists_dir = &args.lists_dir;
    let lists = ListPaths {
        named: args.names_list.unwrap_or_else(|| lists_dir.join(NAMES_LIST)),
        train: args.train_ids.unwrap_or_else(|| lists_dir.join(TRAIN_IDS)),
        dev: args.dev_ids.unwrap_or_else(|| lists_dir.join(DEV_IDS)),
        test: args.test_ids.unwrap_or_else(|| lists_dir.join(TEST_IDS)),
    };
    let mut cfg = ConversionConfig::builder()
        .input(&args.input)
        .output(&args.output)
        .lists(lists)
        .strict(args.strict)
        .append(args.append)
        .follow_symlinks(args.follow_symlinks)
        .show_progress(false);
    if let Some(batch_size) = args.batch_size {
        cfg = cfg.batch_size(batch_size);
    }
    let cfg = cfg.build()?;

    let allowlists = AllowlistSet::load(&cfg.lists).context("failed to load document lists")?;
    let converter = Converter::new(cfg);
    let plan = converter
        .plan(&allowlists)
        .with_context(|| format!("failed to walk corpus {}", args.input.display()))?;

    let progress = if args.no_progress || plan.is_empty() {
        None
    } else {
        let pb = ProgressBar::new(plan.len() as u64);
        let style = ProgressStyle::with_template(
            "{spinner} [{bar:40}] {pos}/{len} documents {elapsed} eta {eta}",
        )
        .context("invalid progress template")?
        .progress_chars("=> ");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    let diagnostics = converter
        .execute(plan, |_| {
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        })
        .with_context(|| format!("failed to convert corpus {}", args.input.display()))?;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if diagnostics.anomalies() > 0 {
        warn!(
            "{} anomalies encountered; rerun with -v for details",
            diagnostics.anomalies()
        );
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        println!(
            "✅ converted {} documents into {}",
            diagnostics.files_converted,
            args.output.display()
        );
        println!("{diagnostics}");
    }
    Ok(())
}

fn run_conll2003(args: Conll2003Args) -> Result<()> {
    if !args.input.is_file() {
        bail!("input {} is not a file", args.input.display());
    }
    if let Some(parent) = args.output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }

    let start = Instant::now();
    let report = convert_legacy_file(&args.input, &args.output, args.strict).with_context(|| {
        format!(
            "failed to convert {} to {}",
            args.input.display(),
            args.output.display()
        )
    })?;
    let elapsed = start.elapsed();
    info!(
        "conversion complete: tokens={} repaired={} duration={elapsed:.2?}",
        report.tokens, report.repaired
    );

    if args.json {
        let summary = json!({
            "input": args.input.display().to_string(),
            "output": args.output.display().to_string(),
            "tokens": report.tokens,
            "repaired": report.repaired,
            "malformed_lines": report.malformed_lines,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "✅ wrote {} tokens to {} ({} span starts repaired, {} malformed lines)",
            report.tokens,
            args.output.display(),
            report.repaired,
            report.malformed_lines
        );
    }
    Ok(())
}

fn run_names(args: NamesArgs) -> Result<()> {
    let walk = WalkConfig {
        follow_symlinks: args.follow_symlinks,
        ..WalkConfig::names_listing()
    };
    let listing = list_document_ids(&args.input, &walk)
        .with_context(|| format!("failed to walk {}", args.input.display()))?;
    if listing.anomalies > 0 {
        warn!(
            "path to ontonotes files appears invalid for {} files",
            listing.anomalies
        );
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create output directory {}", args.output.display()))?;
    let out_path = args.output.join(NAMES_LIST);
    write_id_list(&out_path, &listing.ids)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    println!(
        "wrote {} document ids to {}",
        listing.ids.len(),
        out_path.display()
    );
    Ok(())
}
