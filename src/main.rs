//! stylize CLI - Apply a neural style-transfer model to a photo.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stylize::image::{load_image, save_image};
use stylize::{
    Config, IdentityModel, Invoker, MainQueue, ModelStore, StyleModel, StylizedImage, Stylizer,
    TensorRange,
};

/// How often the main queue is polled while a request runs.
const TICK: Duration = Duration::from_millis(100);

/// Apply a pre-trained neural style-transfer model to a photo.
#[derive(Parser, Debug)]
#[command(name = "stylize")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image path.
    #[arg(value_name = "INPUT", required_unless_present = "list_models")]
    input: Option<PathBuf>,

    /// Output image path.
    #[arg(value_name = "OUTPUT", required_unless_present = "list_models")]
    output: Option<PathBuf>,

    /// ONNX model file, or the name of a model in the model store.
    #[arg(short, long, value_name = "PATH|NAME", conflicts_with = "identity")]
    model: Option<String>,

    /// Run the pipeline with a model that returns its input unchanged.
    #[arg(long)]
    identity: bool,

    /// List the models in the model store and exit.
    #[arg(long)]
    list_models: bool,

    /// Side length of the square model input.
    #[arg(long, default_value = "700", value_name = "INT")]
    size: u32,

    /// Value range of the model's image tensors (byte = 0-255, unit = 0-1).
    #[arg(long, default_value = "byte", value_name = "RANGE")]
    input_range: TensorRange,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("stylize={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    if args.list_models {
        return list_models();
    }

    // clap requires both paths unless --list-models, which returned above.
    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        anyhow::bail!("INPUT and OUTPUT are required");
    };

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let model = load_model(args)?;

    let config = Config {
        output_quality: args.quality,
        ..Config::default()
    };
    let stylizer = Arc::new(Stylizer::new(model, config).context("Failed to initialize stylizer")?);

    let main_queue = MainQueue::new();
    let invoker = Invoker::new(Arc::clone(&stylizer), main_queue.handle())?;

    let image = load_image(input).context("Failed to load input image")?;

    let started = Instant::now();
    let outcome: Arc<Mutex<Option<stylize::Result<StylizedImage>>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&outcome);
    invoker.stylize(image, move |result| {
        if let Ok(mut slot) = slot.lock() {
            *slot = Some(result);
        }
    })?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .expect("valid template"),
    );
    spinner.set_message("Applying style");
    spinner.enable_steady_tick(TICK);

    let take_outcome = || -> Result<Option<stylize::Result<StylizedImage>>> {
        Ok(outcome
            .lock()
            .map_err(|_| anyhow::anyhow!("result slot poisoned"))?
            .take())
    };

    let result = loop {
        main_queue.run_next(TICK);
        if let Some(result) = take_outcome()? {
            break result;
        }
        if !invoker.is_alive() {
            // Whatever the worker posted before it stopped is already queued.
            main_queue.run_pending();
            match take_outcome()? {
                Some(result) => break result,
                None => {
                    spinner.finish_and_clear();
                    anyhow::bail!("Stylize worker stopped without reporting a result");
                }
            }
        }
    };
    spinner.finish_and_clear();

    match result {
        Ok(styled) => {
            save_image(&styled.image, output, stylizer.config().output_quality)
                .context("Failed to save output image")?;
            println!(
                "Success, enjoy!\nTime elapsed: {:.2} seconds",
                started.elapsed().as_secs_f64()
            );
            println!("Saved {}", output.display());
            Ok(())
        }
        Err(err) => {
            tracing::debug!("{err}");
            anyhow::bail!("Failed to process image")
        }
    }
}

fn load_model(args: &Args) -> Result<Arc<dyn StyleModel>> {
    let input_size = (args.size, args.size);

    if args.identity {
        return Ok(Arc::new(IdentityModel::with_input_size(args.size, args.size)));
    }

    let Some(model) = &args.model else {
        anyhow::bail!("Either --model or --identity is required");
    };

    let model = if Path::new(model).is_file() {
        stylize::OnnxStyleModel::load(model, input_size, args.input_range)
    } else {
        ModelStore::new()?.load(model, input_size, args.input_range)
    }
    .context("Failed to load style model")?;

    Ok(Arc::new(model))
}

fn list_models() -> Result<()> {
    let store = ModelStore::new().context("Failed to open model store")?;
    let names = store.available()?;

    println!("Model store: {}", store.model_dir().display());
    if names.is_empty() {
        println!("  (no models installed)");
    }
    for name in names {
        println!("  {name}");
    }

    Ok(())
}
