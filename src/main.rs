//! # chatsplice CLI
//!
//! Command-line interface for the chatsplice library.

use std::process;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser as ClapParser;
use flexi_logger::{Logger, LoggerHandle};

use chatsplice::ChatspliceError;
use chatsplice::cli::Args;
use chatsplice::ingest::Ingestor;
use chatsplice::progress::{IngestEvent, ProgressCallback};

fn main() {
    let args = <Args as ClapParser>::parse();
    let _logger = init_logger(args.log_level());

    if let Err(e) = run(&args) {
        log::error!("event=ingest module=cli status=error message={}", e);
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

/// Logs to stderr; `RUST_LOG` overrides the level chosen by `--verbose`.
fn init_logger(level: &str) -> Option<LoggerHandle> {
    match Logger::try_with_env_or_str(level).and_then(|logger| logger.log_to_stderr().start()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("⚠️  Logging disabled: {}", e);
            None
        }
    }
}

fn run(args: &Args) -> Result<(), ChatspliceError> {
    let total_start = Instant::now();

    println!("🧵 chatsplice v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Input:   {}", args.input_dir.display());
    println!("💾 Archive: {}", args.output_dir.display());
    println!("🗄️  KB:      {}", args.knowledge_base_dir.display());
    if let Some(year) = args.fallback_year {
        println!("📅 Fallback year: {}", year);
    }
    if args.dry_run {
        println!("🧪 Mode:    Dry run (archives and inputs untouched)");
    }
    println!();

    let ingestor = Ingestor::new(&args.knowledge_base_dir, &args.output_dir, args.ingest_config())
        .with_progress(print_progress());
    let report = ingestor.run(&args.input_dir)?;

    if report.is_empty() {
        println!("No .md files found in {}", args.input_dir.display());
        return Ok(());
    }

    println!();
    println!("✅ Done!");
    if let Some(dir) = &report.task_dir {
        println!("   Audit saved to {}", dir.display());
    }

    println!();
    println!("📊 Summary:");
    println!("   Files:     {}", report.files.len());
    println!("   Blocks:    {}", report.blocks());
    for (strategy, count) in report.strategy_counts() {
        println!("   {:<12} {}", format!("{}:", strategy), count);
    }
    println!("   Net lines: {:+}", report.lines_added());

    println!();
    println!("⚡ Total time: {:.2}s", total_start.elapsed().as_secs_f64());

    Ok(())
}

fn print_progress() -> ProgressCallback {
    Arc::new(|event| match event {
        IngestEvent::FileParsed { rel, blocks } => {
            println!("📖 {} ({} blocks)", rel.display(), blocks);
        }
        IngestEvent::BlockMerged {
            index,
            target,
            strategy,
            added_lines,
            ..
        } => {
            println!(
                "   🔀 #{} → {} [{}] {:+} lines",
                index,
                target.display(),
                strategy,
                added_lines
            );
        }
        IngestEvent::FileRelocated { rel, to } => {
            println!("   📦 Archived: {} -> {}", rel.display(), to.display());
        }
    })
}
