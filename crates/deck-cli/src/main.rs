mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_STORE_ERROR, EXIT_VALIDATION_ERROR};
use deck_core::CleaningKind;
use deck_store::{DeckLayout, Layer};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "deck",
    version,
    about = "Layered lifecycle manager for containerized development environments"
)]
struct Cli {
    /// Path to the .deck configuration tree.
    #[arg(long, default_value = "~/.deck")]
    root: String,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayerArg {
    Templates,
    Custom,
    Images,
}

impl From<LayerArg> for Layer {
    fn from(arg: LayerArg) -> Self {
        match arg {
            LayerArg::Templates => Layer::Template,
            LayerArg::Custom => Layer::Custom,
            LayerArg::Images => Layer::Image,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CleanKindArg {
    Images,
    Custom,
    Templates,
    All,
    Selective,
}

impl From<CleanKindArg> for CleaningKind {
    fn from(arg: CleanKindArg) -> Self {
        match arg {
            CleanKindArg::Images => CleaningKind::Images,
            CleanKindArg::Custom => CleaningKind::Custom,
            CleanKindArg::Templates => CleaningKind::Templates,
            CleanKindArg::All => CleaningKind::All,
            CleanKindArg::Selective => CleaningKind::Selective,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the .deck layer tree.
    Init,
    /// List configurations, optionally restricted to one layer.
    List {
        /// Layer to list (templates, custom, or images).
        #[arg(long)]
        layer: Option<LayerArg>,
    },
    /// Promote a template into an editable custom configuration.
    Create {
        /// Template name.
        template: String,
        /// Name for the custom configuration (allocated when omitted).
        #[arg(long)]
        name: Option<String>,
    },
    /// Promote a custom configuration into a built image.
    Build {
        /// Custom configuration name.
        custom: String,
        /// Image name (timestamped from the custom name when omitted).
        #[arg(long)]
        image: Option<String>,
    },
    /// Enter, restart, or build-and-start the environment for a name.
    Up {
        /// Custom configuration or image name.
        name: String,
        /// Container engine to use.
        #[arg(long, default_value = "compose")]
        engine: String,
    },
    /// Plan and remove accumulated images and custom configurations.
    Clean {
        /// What to clean.
        kind: CleanKindArg,
        /// Names to clean (comma-separated).
        #[arg(long, value_delimiter = ',')]
        items: Vec<String>,
        /// Only report what would be removed.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long, default_value_t = false)]
        yes: bool,
        /// Show a keep-latest-N plan for this N instead of executing.
        #[arg(long)]
        keep_latest: Option<usize>,
    },
    /// Show the metadata ledger of a built image.
    Inspect {
        /// Image name.
        image: String,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DECK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let root = expand_tilde(&cli.root);
    let layout = DeckLayout::new(&root);
    let json = cli.json;

    let result = match cli.command {
        Commands::Init => commands::init::run(&layout, json),
        Commands::List { layer } => commands::list::run(&layout, layer.map(Layer::from), json),
        Commands::Create { template, name } => {
            commands::create::run(&layout, &template, name.as_deref(), json)
        }
        Commands::Build { custom, image } => {
            commands::build::run(&layout, &custom, image.as_deref(), json)
        }
        Commands::Up { name, engine } => commands::up::run(&layout, &name, &engine, json),
        Commands::Clean {
            kind,
            items,
            dry_run,
            yes,
            keep_latest,
        } => commands::clean::run(
            &layout,
            CleaningKind::from(kind),
            items,
            dry_run,
            yes,
            keep_latest,
            json,
        ),
        Commands::Inspect { image } => commands::inspect::run(&layout, &image, json),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("validation failed:")
                || msg.starts_with("incomplete configuration")
            {
                EXIT_VALIDATION_ERROR
            } else if msg.starts_with("store error:") {
                EXIT_STORE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
