//! WMRH card database exporter - Main Binary

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wmrh_carddb::{
    config::{ExportConfig, DEFAULT_AUTHOR},
    export::{decode_artifact, Compression},
    loader::{
        feed::{KRCG_URL, SCHEMA_URL},
        SourceLocation,
    },
    pipeline::{run_export, ExportSummary, ValidationOutcome},
    profile::OutputProfile,
};

#[derive(Parser)]
#[command(name = "wmrh")]
#[command(about = "Export the KRCG VTES card feed as WMRH card databases", long_about = None)]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the card feed and write the requested artifacts
    Export {
        /// Card feed URL or local JSON file
        #[arg(long, default_value = KRCG_URL)]
        source: SourceLocation,

        /// Write the XML card database here
        #[arg(long, value_name = "PATH")]
        xml: Option<PathBuf>,

        /// Write the JSON card database here
        #[arg(long, value_name = "PATH")]
        json: Option<PathBuf>,

        /// Write the MessagePack card database here
        #[arg(long, value_name = "PATH")]
        binary: Option<PathBuf>,

        /// Also write a compressed copy of the binary artifact (gzip, zstd)
        #[arg(long, requires = "binary")]
        compress: Option<Compression>,

        /// Validate the XML artifact against the schema
        #[arg(long, requires = "xml")]
        validate: bool,

        /// Schema URL or local file, also advertised in the XML root
        #[arg(long, default_value = SCHEMA_URL)]
        schema: SourceLocation,

        /// Output profile (wmrh, full)
        #[arg(long, default_value = "wmrh")]
        profile: OutputProfile,

        /// Leave token cards out
        #[arg(long)]
        no_tokens: bool,

        /// Put token cards in their own section
        #[arg(long)]
        separate_tokens: bool,

        /// Author stamped in the header
        #[arg(long, default_value = DEFAULT_AUTHOR)]
        author: String,

        /// Override the profile's format version
        #[arg(long)]
        format_version: Option<String>,

        /// Write single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Decode an artifact and summarize its contents
    Inspect {
        /// Artifact file (.xml, .json, .msgpack/.bin, optionally .gz/.zst)
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Export {
            source,
            xml,
            json,
            binary,
            compress,
            validate,
            schema,
            profile,
            no_tokens,
            separate_tokens,
            author,
            format_version,
            compact,
        } => {
            let mut profile = profile;
            if no_tokens {
                profile = profile.with_tokens(false);
            }
            if separate_tokens {
                profile = profile.with_separate_tokens(true);
            }
            if let Some(version) = format_version {
                profile = profile.with_format_version(version);
            }

            let config = ExportConfig {
                source,
                xml,
                json,
                binary,
                compression: compress,
                validate,
                schema,
                profile,
                author,
                pretty_json: !compact,
            };
            if !config.has_outputs() {
                println!("No artifacts requested (use --xml, --json or --binary)");
            }

            let summary = run_export(&config)
                .await
                .with_context(|| format!("export from {} failed", config.source))?;
            print_summary(&summary);
        }
        Commands::Inspect { file } => {
            let doc = decode_artifact(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            let split = doc.partition();

            println!("=== {} ===", file.display());
            println!("  Author:    {}", doc.info.author);
            println!("  Created:   {}", doc.info.created_at);
            println!("  Source:    {}", doc.info.source_url);
            println!("  Version:   {}", doc.info.format_version);
            println!("  Sets:      {}", doc.sets.len());
            println!("  Crypt:     {}", split.crypt.len());
            println!("  Library:   {}", split.library.len());
            if !doc.tokens.is_empty() {
                println!("  Tokens:    {} (separate section)", doc.tokens.len());
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &ExportSummary) {
    println!("=== Export complete ===");
    println!(
        "  Cards: {} ({} crypt, {} library, {} tokens)",
        summary.cards, summary.crypt, summary.library, summary.tokens
    );
    println!("  Sets:  {}", summary.sets);
    if !summary.skipped.is_empty() {
        println!("  Skipped {} malformed records:", summary.skipped.len());
        for err in &summary.skipped {
            println!("    {err}");
        }
    }
    if !summary.unknown_sets.is_empty() {
        println!("  Unknown sets: {}", summary.unknown_sets.join(", "));
    }

    match &summary.validation {
        ValidationOutcome::NotRequested => {}
        ValidationOutcome::Passed => println!("  Schema validation: passed"),
        ValidationOutcome::Failed(violations) => {
            println!("  Schema validation: {} violations", violations.len())
        }
        ValidationOutcome::Skipped(reason) => println!("  Schema validation skipped: {reason}"),
    }

    for artifact in &summary.written {
        println!(
            "  Wrote {} ({}, {} bytes)",
            artifact.path.display(),
            artifact.format,
            artifact.bytes
        );
    }
    for (path, err) in &summary.failed {
        println!("  FAILED {}: {err}", path.display());
    }
}
