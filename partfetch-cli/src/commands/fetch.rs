//! `partfetch fetch` - download the parts listed in a manifest.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use partfetch::config::ConfigFile;
use partfetch::fetch::{DownloadBoard, DownloadStatus, FetchEvent, FetchEventKind};
use partfetch::{FetchCoordinator, FetchRequest, Manifest, PartCombiner};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::combine::{combine_and_verify, print_summary, verification};
use super::common::{resolve_encoding, resolve_extension, EncodingArg};
use crate::error::CliError;

/// Arguments for `fetch`.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Manifest file path or http(s) URL
    #[arg(short, long)]
    pub manifest: String,

    /// Directory to download the parts into
    #[arg(short, long)]
    pub dest: PathBuf,

    /// Maximum simultaneous downloads (defaults to config)
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Combine the downloaded parts into this file
    #[arg(long)]
    pub combine: Option<PathBuf>,

    /// Part file extension used when combining (defaults to config)
    #[arg(long)]
    pub ext: Option<String>,

    /// How payloads are stored (defaults to config)
    #[arg(long, value_enum)]
    pub encoding: Option<EncodingArg>,

    /// Check each payload against the hash in its header when combining
    #[arg(long)]
    pub strict: bool,
}

/// Run `fetch`.
pub fn run(args: FetchArgs, config: &ConfigFile) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("Failed to start async runtime: {}", e)))?;

    runtime.block_on(run_async(args, config))
}

async fn run_async(args: FetchArgs, config: &ConfigFile) -> Result<(), CliError> {
    let manifest = load_manifest(&args.manifest).await?;
    let requests = manifest.requests()?;

    let mut fetch_config = config.fetch_config();
    if let Some(concurrency) = args.concurrency {
        fetch_config = fetch_config.with_concurrency(concurrency);
    }

    if manifest.name.is_empty() {
        println!("Fetching {} parts", requests.len());
    } else {
        println!("Fetching {} ({} parts)", manifest.name, requests.len());
    }
    println!("Press Ctrl+C to cancel");
    println!();

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    let coordinator = FetchCoordinator::with_http(fetch_config)?;
    let (tx, mut rx) = mpsc::unbounded_channel::<FetchEvent>();
    let mut view = ProgressView::new(&requests, ProgressDrawTarget::stderr());

    let download = async {
        let tx = tx;
        coordinator
            .fetch_all(&requests, &args.dest, &cancel, &tx)
            .await
    };
    let render = async {
        while let Some(event) = rx.recv().await {
            view.apply(&event);
        }
    };

    let (result, ()) = tokio::join!(download, render);
    view.finish();

    let paths = match result {
        Ok(paths) => paths,
        Err(e) if e.is_cancelled() => {
            println!("{}", style("Download cancelled").yellow());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "{} Downloaded {} parts to {}",
        style("[OK]").green(),
        paths.len(),
        args.dest.display()
    );

    if let Some(output) = &args.combine {
        combine_downloaded(&args, config, &manifest, output)?;
    }

    Ok(())
}

async fn load_manifest(source: &str) -> Result<Manifest, CliError> {
    let manifest = if is_url(source) {
        Manifest::fetch(source).await?
    } else {
        Manifest::load(Path::new(source))?
    };
    info!(
        name = %manifest.name,
        parts = manifest.listparts.len(),
        "Loaded manifest"
    );
    Ok(manifest)
}

fn is_url(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn combine_downloaded(
    args: &FetchArgs,
    config: &ConfigFile,
    manifest: &Manifest,
    output: &Path,
) -> Result<(), CliError> {
    let encoding = resolve_encoding(args.encoding, config);

    let mut combiner = PartCombiner::new()
        .with_extension(resolve_extension(args.ext.clone(), config))
        .with_encoding(encoding)
        .with_verification(verification(args.strict));
    if manifest.numparts > 0 {
        let expected = usize::try_from(manifest.numparts).map_err(|_| {
            CliError::Config(format!("Manifest part count {} is too large", manifest.numparts))
        })?;
        combiner = combiner.with_expected_parts(expected);
    }

    let summary = combine_and_verify(&combiner, &args.dest, output, manifest.sha256())?;
    print_summary(&summary, output, encoding);
    Ok(())
}

/// Progress bars driven by fetch events.
struct ProgressView {
    multi: MultiProgress,
    overall: ProgressBar,
    bars: Vec<ProgressBar>,
    board: DownloadBoard,
}

impl ProgressView {
    fn new(requests: &[FetchRequest], target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let overall = multi.add(ProgressBar::new(requests.len() as u64));
        overall.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} parts {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        overall.enable_steady_tick(Duration::from_millis(120));

        let item_style =
            ProgressStyle::with_template("  {prefix:<32!} [{bar:30}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");

        let bars = requests
            .iter()
            .map(|request| {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(item_style.clone());
                bar.set_prefix(request.file_name.clone());
                bar.set_message(DownloadStatus::Pending.label());
                bar
            })
            .collect();

        Self {
            multi,
            overall,
            bars,
            board: DownloadBoard::new(requests),
        }
    }

    fn apply(&mut self, event: &FetchEvent) {
        let Some(item) = self.board.apply(event) else {
            return;
        };
        let Some(bar) = self.bars.get(item.id) else {
            return;
        };

        match &event.kind {
            FetchEventKind::Progress(percent) => bar.set_position(u64::from(*percent)),
            FetchEventKind::Status(DownloadStatus::Completed(elapsed)) => {
                bar.set_position(100);
                bar.finish_with_message(format!("done in {:.1}s", elapsed.as_secs_f64()));
            }
            FetchEventKind::Status(DownloadStatus::Failed(reason)) => {
                bar.abandon_with_message(style(format!("failed: {}", reason)).red().to_string());
            }
            FetchEventKind::Status(status) => bar.set_message(status.label()),
        }

        self.overall.set_position(self.board.completed() as u64);
    }

    fn finish(&self) {
        self.overall.finish();
        let _ = self.multi.clear();
    }
}
