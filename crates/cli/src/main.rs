//! CLI tool for extracting pictures from a folder of PowerPoint files.

use anyhow::{bail, Context, Result};
use clap::Parser;
use slidepics_core::types::{DEFAULT_CLEANED_DIR, DEFAULT_IMAGES_DIR};
use slidepics_core::{BatchEvent, BatchReport, BatchRequest, BatchStatus, ErrorPolicy, FileOutcome};
use slidepics_pptx::PptxParser;
use std::path::PathBuf;

/// Extract the pictures of every .pptx file in a folder and save copies
/// without them.
#[derive(Parser, Debug)]
#[command(name = "slidepics")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder containing the .pptx files (not searched recursively)
    input: PathBuf,

    /// Folder for extracted pictures, relative to the input folder
    #[arg(long, default_value = DEFAULT_IMAGES_DIR)]
    images_dir: PathBuf,

    /// Folder for picture-free and unchanged copies, relative to the input folder
    #[arg(long, default_value = DEFAULT_CLEANED_DIR)]
    cleaned_dir: PathBuf,

    /// Stop at the first presentation that cannot be opened or saved
    #[arg(long)]
    fail_fast: bool,

    /// Print the batch report as JSON instead of progress lines
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if !args.input.is_dir() {
        bail!("Input folder not found: {}", args.input.display());
    }

    let request = build_request(&args);
    log::debug!("Batch request: {:?}", request);

    let handle = slidepics_core::submit(PptxParser::new(), request)
        .context("Failed to start the batch worker")?;

    for event in handle.events() {
        if !args.json {
            print_event(&event, &args);
        }
    }

    let report = handle
        .join()
        .with_context(|| format!("Batch aborted in {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

/// Resolve the output folders against the input folder.
fn build_request(args: &Args) -> BatchRequest {
    let policy = if args.fail_fast {
        ErrorPolicy::Abort
    } else {
        ErrorPolicy::Continue
    };

    BatchRequest::new(
        &args.input,
        args.input.join(&args.images_dir),
        args.input.join(&args.cleaned_dir),
    )
    .with_error_policy(policy)
}

/// Print one progress line.
fn print_event(event: &BatchEvent, args: &Args) {
    match event {
        BatchEvent::NoFilesFound => {
            eprintln!("Warning: no .pptx files found in {}", args.input.display());
        }
        BatchEvent::FilesDiscovered { count } => {
            println!("Found {} presentation(s)", count);
        }
        BatchEvent::ImageWriteFailed { path, error } => {
            eprintln!("  could not save {}: {}", path.display(), error);
        }
        BatchEvent::FileProcessed(report) => match &report.outcome {
            FileOutcome::Stripped { images } => {
                println!(
                    "[ok] {} -> {} image(s) extracted, picture-free copy saved",
                    report.filename, images
                );
            }
            FileOutcome::CopiedUnchanged => {
                println!("[--] {} -> no images, copied unchanged", report.filename);
            }
            FileOutcome::Failed { reason } => {
                eprintln!("[!!] {}: {}", report.filename, reason);
            }
        },
        BatchEvent::FileFailed { path, error } => {
            eprintln!("[!!] {}: {}", path.display(), error);
        }
    }
}

/// Print the completion notice and any failed files.
fn print_summary(report: &BatchReport) {
    if report.status == BatchStatus::NoFilesFound {
        return;
    }

    println!(
        "Done: {} image(s) from {} presentation(s), {} copied unchanged",
        report.total_images(),
        report.stripped_count(),
        report.copied_count()
    );

    let failed = report.failed_files();
    if !failed.is_empty() {
        eprintln!("{} presentation(s) could not be processed:", failed.len());
        for file in failed {
            eprintln!("  {}", file.filename);
        }
    }
}
