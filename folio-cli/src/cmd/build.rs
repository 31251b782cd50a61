use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use folio_core::build_site;
use log::{info, warn};
use std::time::SystemTime;

use crate::config::{describe, load_build_config};
use crate::logging::{FormatElapsedTimeOptions, format_elapsed_time};

pub fn add_build_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory, wiped before every build [default: docs]"),
        )
        .arg(
            Arg::new("static")
                .long("static")
                .value_name("DIR")
                .help("Asset directory copied to <output>/static [default: static]"),
        )
        .arg(
            Arg::new("standalone")
                .long("standalone")
                .value_name("DIR")
                .help(
                    "Pre-built standalone projects merged onto the output root \
                     [default: static_pages]",
                ),
        )
        .arg(
            Arg::new("projects")
                .long("projects")
                .value_name("DIR")
                .help("Standalone subdirectory scanned for sitemap entries [default: projects]"),
        )
        .arg(
            Arg::new("templates")
                .short('t')
                .long("templates")
                .value_name("DIR")
                .help("Template directory [default: templates]"),
        )
        .arg(
            Arg::new("content")
                .long("content")
                .value_name("FILE")
                .help("Portfolio content file [default: content.toml]"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Canonical site URL used in the sitemap"),
        )
        .arg(
            Arg::new("domain")
                .long("domain")
                .value_name("HOST")
                .help("Hostname written to CNAME [default: host of the base URL]"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file [default: ./folio.toml]"),
        )
}

pub fn make_subcommand() -> Command {
    add_build_args(Command::new("build")).about("Build the static site into the output directory")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let started = SystemTime::now();

    // Load cascading configuration
    let build_config = load_build_config(args)?;
    for line in describe(&build_config) {
        log::debug!(target: "config", "{line}");
    }

    let report = build_site(&build_config)
        .with_context(|| format!("failed to build {}", build_config.output_dir.display()))?;

    for failure in &report.failed_pages {
        warn!(
            target: "build",
            "{} was not generated: {}",
            failure.page.route().output,
            failure.error
        );
    }
    if report.sitemap.is_none() {
        warn!(target: "build", "Site built without a sitemap");
    }

    let elapsed = format_elapsed_time(started.elapsed(), &FormatElapsedTimeOptions::default())?;
    info!(
        target: "build",
        "Done! Site ready in {} ({} pages, {} files copied) in {}",
        report.output_dir.display(),
        report.pages_rendered.len(),
        report.files_copied,
        elapsed
    );

    Ok(())
}
