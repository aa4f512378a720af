use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use workflow::config::InspectorConfig;
use workflow::runner::{Format, Runner};

mod report;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Decode and summarise CST far-field pattern files")]
struct Args {
    /// Pattern file to decode
    path: PathBuf,
    /// File format; inferred from the extension when omitted
    #[arg(long, value_enum)]
    format: Option<Format>,
    /// Stream samples lazily instead of loading the whole file (sectioned only)
    #[arg(long, default_value_t = false)]
    lazy: bool,
    /// Number of samples printed with --lazy
    #[arg(long)]
    limit: Option<usize>,
    /// Print JSON instead of a text summary
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Load decoder settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = &args.config {
        InspectorConfig::load(path)?
    } else {
        InspectorConfig::default()
    };

    let format = args.format.unwrap_or_else(|| Format::infer(&args.path));
    let runner = Runner::new(config);
    let cancel = CancellationToken::new();

    if args.lazy {
        anyhow::ensure!(
            format == Format::Sectioned,
            "--lazy is only available for farfield source files"
        );
    }

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for decoding")?;
    let summary = runtime.block_on(async {
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });
        if args.lazy {
            let (runner, path, limit, cancel) =
                (runner.clone(), args.path.clone(), args.limit, cancel.clone());
            tokio::task::spawn_blocking(move || runner.stream(&path, limit, &cancel))
                .await
                .context("lazy decode task")
                .and_then(|summary| summary)
        } else {
            runner.execute(&args.path, format, &cancel).await
        }
    })?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serialising summary")?
        );
    } else {
        print!("{}", summary);
    }

    Ok(())
}
