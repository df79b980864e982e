//! kiplace CLI - component placement and annotation on KiCad boards from the command line.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use kiplace::{
    banner, load_pcb, ComponentSelection, HelperOptions, HorizJustify, JustifyOutcome, KiplaceError, PcbDocument,
    PlacementHelper, PlacementOutcome,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kiplace")]
#[command(about = "KiCad component placement and annotation tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with text and legend defaults
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List footprint references, optionally filtered by a wildcard
    List {
        #[command(flatten)]
        input: InputArgs,

        /// Shell-style pattern, e.g. "R*" or "C?"
        #[arg(short, long)]
        pattern: Option<String>,
    },

    /// Place a component relative to another one
    Place {
        #[command(flatten)]
        board: BoardArgs,

        /// Anchor component
        reference: String,

        /// Component to move
        component: String,

        #[command(flatten)]
        offset: Offset,
    },

    /// Chain-place components, each relative to the previous one
    Chain {
        #[command(flatten)]
        board: BoardArgs,

        /// Components in chain order
        #[arg(required_unless_present = "pattern", conflicts_with = "pattern")]
        components: Vec<String>,

        /// Chain every component matching this pattern instead
        #[arg(short, long)]
        pattern: Option<String>,

        #[command(flatten)]
        offset: Offset,
    },

    /// Move reference labels relative to their footprints
    RefLabel {
        #[command(flatten)]
        board: BoardArgs,

        #[arg(required = true)]
        components: Vec<String>,

        #[command(flatten)]
        offset: Offset,

        /// left, center or right
        #[arg(short, long)]
        justify: Option<String>,
    },

    /// Move a value label relative to its footprint
    ValueLabel {
        #[command(flatten)]
        board: BoardArgs,

        component: String,

        #[command(flatten)]
        offset: Offset,

        /// left, center or right
        #[arg(short, long)]
        justify: Option<String>,
    },

    /// Move a value label to the silkscreen of its footprint's side
    ValueToSilk {
        #[command(flatten)]
        board: BoardArgs,

        component: String,
    },

    /// Lock tracks on the given nets
    Lock {
        #[command(flatten)]
        board: BoardArgs,

        #[arg(required = true)]
        nets: Vec<String>,

        /// Only tracks at least this wide (mm)
        #[arg(long, default_value_t = 0.0)]
        min_width: f64,
    },

    /// Unlock tracks on the given nets
    Unlock {
        #[command(flatten)]
        board: BoardArgs,

        #[arg(required = true)]
        nets: Vec<String>,

        /// Only tracks at least this wide (mm)
        #[arg(long, default_value_t = 0.0)]
        min_width: f64,
    },

    /// Lock every track, whatever its net
    LockAll {
        #[command(flatten)]
        board: BoardArgs,

        /// Only tracks at least this wide (mm)
        #[arg(long, default_value_t = 0.0)]
        min_width: f64,
    },

    /// Select every zone on the board
    SelectZones {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Drop a reference/value legend onto the silkscreen
    Legend {
        #[command(flatten)]
        board: BoardArgs,

        /// Legend origin X (mm)
        #[arg(short, long, allow_negative_numbers = true)]
        x: f64,

        /// Legend origin Y (mm)
        #[arg(short, long, allow_negative_numbers = true)]
        y: f64,

        /// Skip components matching these patterns (repeatable)
        #[arg(short, long)]
        ignore: Vec<String>,

        /// Place on the back silkscreen, mirrored
        #[arg(long)]
        bottom: bool,
    },

    /// Show example helper calls
    Examples,
}

#[derive(Args)]
struct InputArgs {
    /// Path to .kicad_pcb file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,
}

#[derive(Args)]
struct BoardArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Write the modified board here
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Overwrite the input board
    #[arg(long, conflicts_with = "output")]
    in_place: bool,
}

#[derive(Args)]
struct Offset {
    /// X offset (mm)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    dx: f64,

    /// Y offset (mm)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    dy: f64,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

/// What a command prints: text lines for humans, one JSON document otherwise.
struct Report {
    lines: Vec<String>,
    json: serde_json::Value,
}

impl Report {
    fn new(json: serde_json::Value) -> Self {
        Self {
            lines: Vec::new(),
            json,
        }
    }

    fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    fn written(&mut self, path: &Path) {
        self.lines.push(format!("Wrote {}", path.display()));
        if let Some(obj) = self.json.as_object_mut() {
            obj.insert("written".to_string(), json!(path.display().to_string()));
        }
    }

    fn print(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Human => {
                for line in &self.lines {
                    println!("{}", line);
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&self.json)?),
        }
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli.command, cli.config.as_deref()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands, config: Option<&Path>) -> Result<()> {
    match command {
        Commands::List { input, pattern } => handle_list(&input, pattern.as_deref(), config),
        Commands::Place {
            board,
            reference,
            component,
            offset,
        } => modify(&board, config, |helper| {
            let at = helper.place_component_relative_mm(&reference, &component, offset.dx, offset.dy, false)?;
            Ok(Report::new(json!({ "component": component, "position": at }))
                .line(format!("Placed {} relative to {} at {}", component, reference, at)))
        }),
        Commands::Chain {
            board,
            components,
            pattern,
            offset,
        } => modify(&board, config, |helper| {
            let outcome = match pattern.as_deref() {
                Some(pattern) => helper.place_chain_relative(pattern, offset.dx, offset.dy)?,
                None => helper.place_components_relative_mm(&components, offset.dx, offset.dy, false)?,
            };
            let line = match outcome {
                PlacementOutcome::Applied { moved } => format!("Placed {} component(s) in a chain", moved),
                PlacementOutcome::Skipped { matched } => {
                    format!("Chain skipped: {} component(s) matched, need at least 2", matched)
                }
            };
            Ok(Report::new(json!({ "outcome": outcome })).line(line))
        }),
        Commands::RefLabel {
            board,
            components,
            offset,
            justify,
        } => modify(&board, config, |helper| {
            let count = components.len();
            let outcome = helper.place_component_reference_position(
                ComponentSelection::from(components),
                offset.dx,
                offset.dy,
                justify.as_deref(),
                false,
            )?;
            Ok(Report::new(json!({ "labels": count, "justify": outcome }))
                .line(format!("Moved {} reference label(s)", count))
                .line(describe_justify(&outcome)))
        }),
        Commands::ValueLabel {
            board,
            component,
            offset,
            justify,
        } => modify(&board, config, |helper| {
            let outcome =
                helper.place_component_value_position(&component, offset.dx, offset.dy, justify.as_deref())?;
            Ok(Report::new(json!({ "component": component, "justify": outcome }))
                .line(format!("Moved value label of {}", component))
                .line(describe_justify(&outcome)))
        }),
        Commands::ValueToSilk { board, component } => modify(&board, config, |helper| {
            let layer = helper.place_component_value_to_silk_layer(&component)?;
            Ok(Report::new(json!({ "component": component, "layer": layer }))
                .line(format!("Value label of {} is now on {}", component, layer)))
        }),
        Commands::Lock {
            board,
            nets,
            min_width,
        } => modify(&board, config, |helper| {
            let count = helper.lock_tracks_with_signal_name(&nets, min_width)?;
            Ok(Report::new(json!({ "nets": nets, "locked": count }))
                .line(format!("Locked {} track(s) on {}", count, nets.join(", "))))
        }),
        Commands::Unlock {
            board,
            nets,
            min_width,
        } => modify(&board, config, |helper| {
            let count = helper.unlock_tracks_with_signal_name(&nets, min_width)?;
            Ok(Report::new(json!({ "nets": nets, "unlocked": count }))
                .line(format!("Unlocked {} track(s) on {}", count, nets.join(", "))))
        }),
        Commands::LockAll { board, min_width } => modify(&board, config, |helper| {
            let count = helper.lock_all_tracks(min_width)?;
            Ok(Report::new(json!({ "locked": count })).line(format!("Locked {} track(s)", count)))
        }),
        Commands::SelectZones { input } => {
            let mut helper = open(&input, config)?;
            let count = helper.select_all_areas()?;
            Report::new(json!({ "selected": count }))
                .line(format!("Selected {} zone(s)", count))
                .print(input.format)
        }
        Commands::Legend {
            board,
            x,
            y,
            ignore,
            bottom,
        } => modify(&board, config, |helper| {
            let report = helper.bom_value_legend(x, y, &ignore, bottom)?;
            let mut out = Report::new(serde_json::to_value(&report)?).line(format!(
                "Legend with {} row(s) on {}",
                report.rows.len(),
                report.layer
            ));
            for row in &report.rows {
                out = out.line(format!("  {:<8} {}", row.reference, row.value));
            }
            Ok(out)
        }),
        Commands::Examples => {
            println!("{}", banner());
            Ok(())
        }
    }
}

fn handle_list(input: &InputArgs, pattern: Option<&str>, config: Option<&Path>) -> Result<()> {
    let helper = open(input, config)?;
    let names = match pattern {
        Some(p) => helper.get_wildcard_component_names(p, None)?,
        None => helper.get_all_component_names()?,
    };
    let board = helper.board()?;
    let mut report = Report::new(json!({
        "file": input.file.display().to_string(),
        "dialect": board.dialect(),
        "components": names,
    }));
    report.lines = names.clone();
    report.print(input.format)
}

fn describe_justify(outcome: &JustifyOutcome) -> String {
    match outcome {
        JustifyOutcome::Applied(j) => {
            let name = match j {
                HorizJustify::Left => "left",
                HorizJustify::Center => "center",
                HorizJustify::Right => "right",
            };
            format!("Justification set to {}", name)
        }
        JustifyOutcome::Ignored(s) => format!("Unknown justification '{}' ignored", s),
        JustifyOutcome::Unchanged => "Justification unchanged".to_string(),
    }
}

fn open(input: &InputArgs, config: Option<&Path>) -> Result<PlacementHelper<PcbDocument>> {
    let options = match config {
        Some(path) => HelperOptions::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => HelperOptions::default(),
    };
    let doc = load_pcb(&input.file).with_context(|| format!("failed to load {}", input.file.display()))?;
    Ok(PlacementHelper::with_options(doc, options))
}

/// Load, run one mutating operation, write back if asked and print the report.
fn modify<F>(board: &BoardArgs, config: Option<&Path>, op: F) -> Result<()>
where
    F: FnOnce(&mut PlacementHelper<PcbDocument>) -> Result<Report>,
{
    let mut helper = open(&board.input, config)?;
    let mut report = op(&mut helper)?;

    let target = match (&board.output, board.in_place) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(board.input.file.clone()),
        (None, false) => None,
    };
    match target {
        Some(path) => {
            let doc = helper.into_board().ok_or(KiplaceError::NoDesignOpen)?;
            doc.save(&path)
                .map_err(KiplaceError::from)
                .with_context(|| format!("failed to write {}", path.display()))?;
            report.written(&path);
        }
        None => info!("Board not written; pass --output or --in-place to save changes."),
    }

    report.print(board.input.format)
}
