use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stereo_suite::{config, output, process};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "stereo-suite")]
#[command(about = "Batch converter for side-by-side stereo photographs")]
#[command(long_about = "\
Batch converter for side-by-side stereo photographs

Every .jpg in the source directory is a stereo pair: left eye on the left
half, right eye on the right half. Each pair is rendered as

  <slug>_stereo.tif                   layered master (seven named layers)
  <slug>_parallel.jpg                 unchanged pair
  <slug>_crosseyed.jpg                halves swapped
  <slug>_anaglyph-redBlue.jpg         red/cyan anaglyph
  <slug>_anaglyph-greenMagenta.jpg    green/magenta anaglyph

and listed in stereo_manifest.xml, ordered by date.

Metadata comes from stereo.toml in the source directory:

  [defaults]
  photographer = \"Jane Doe\"
  year = 2024

  [photos.\"harbour.jpg\"]
  title = \"Harbour at Dusk\"
  month = \"March\"

Run 'stereo-suite gen-config' to generate a documented stereo.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory holding the stereo pairs
    #[arg(long, default_value = "originals", global = true)]
    source: PathBuf,

    /// Directory receiving the renderings and the manifest
    #[arg(long, default_value = "processed", global = true)]
    output: PathBuf,

    /// Batch config file [default: <source>/stereo.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every stereo pair and write the manifest
    Process,
    /// Validate inputs and metadata without writing anything
    Check,
    /// Print a stock stereo.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Process => {
            let batch = load_batch_config(&cli.source, cli.config.as_deref())?;
            init_thread_pool(&batch.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(&cli.source, &cli.output, &batch, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            output::print_summary(&result?);
        }
        Command::Check => {
            let batch = load_batch_config(&cli.source, cli.config.as_deref())?;
            println!("==> Checking {}", cli.source.display());
            let plan = process::plan(&cli.source, &batch)?;
            output::print_plan(&plan);
            if plan.has_problems() {
                return Err("check found problems".into());
            }
            println!("==> Inputs are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_batch_config(
    source: &Path,
    explicit: Option<&Path>,
) -> Result<config::BatchConfig, config::ConfigError> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config::default_config_path(source));
    config::load_config(&path)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
