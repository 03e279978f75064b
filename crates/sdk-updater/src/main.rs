// SPDX-License-Identifier: MIT OR Apache-2.0

mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use libsdk_updater::{
    CheckResult, JsonOutput, PackageEntry, PlanEntry, PlanSummary, SourceFailure, Verbosity,
    check_updates, list_installed, list_remote, plan_for,
};

use crate::config::CliConfig;

mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const BLOCKED: i32 = 1;
    pub const FATAL_ERROR: i32 = 2;
}

mod ansi {
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";

    #[inline]
    pub fn bold(s: &str) -> String {
        if atty::is(atty::Stream::Stdout) {
            format!("{BOLD}{s}{RESET}")
        } else {
            s.to_string()
        }
    }
}

#[derive(Parser)]
#[command(name = "sdk-updater")]
#[command(about = "resolve android sdk package updates and their dependencies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// sdk root to scan (defaults to $ANDROID_SDK_ROOT, then $ANDROID_HOME)
    #[arg(long, global = true)]
    sdk_root: Option<PathBuf>,

    /// catalog url or path; replaces the configured sources (repeatable)
    #[arg(long = "source", global = true)]
    sources: Vec<String>,

    /// enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// output results as json
    #[arg(long, global = true)]
    json: bool,

    /// consider obsolete packages
    #[arg(long, global = true)]
    include_obsoletes: bool,

    /// fetch https catalogs over http
    #[arg(long, global = true)]
    force_http: bool,

    /// open configuration file in editor
    #[arg(long)]
    edit_config: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// check installed packages for updates
    Check {
        /// also suggest new platforms, add-ons, samples, extras and docs
        #[arg(long)]
        suggest_new: bool,
    },
    /// list installed packages
    ListInstalled,
    /// list remote packages available for this host
    ListRemote,
    /// resolve the install plan for remote packages matching the filters
    Plan {
        /// case-insensitive substrings of package descriptions
        #[arg(required = true)]
        filters: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if cli.edit_config {
        if let Err(e) = CliConfig::edit_config() {
            output_error(&cli, &e.to_string());
            std::process::exit(exit_codes::FATAL_ERROR);
        }
        return;
    }

    let config = match CliConfig::load() {
        Ok(c) => apply_overrides(c, &cli),
        Err(e) => {
            output_error(&cli, &format!("failed to load config: {e}"));
            std::process::exit(exit_codes::FATAL_ERROR);
        }
    };

    log::debug!(
        "**cli:** sdk root {}, {} source(s)",
        config.sdk_root.display(),
        config.sources.len()
    );

    let default_command = Commands::Check { suggest_new: false };
    let result = match cli.command.as_ref().unwrap_or(&default_command) {
        Commands::Check { suggest_new } => cmd_check(&cli, &config, *suggest_new),
        Commands::ListInstalled => cmd_list_installed(&cli, &config),
        Commands::ListRemote => cmd_list_remote(&cli, &config),
        Commands::Plan { filters } => cmd_plan(&cli, &config, filters),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output_error(&cli, &e.to_string());
            std::process::exit(exit_codes::FATAL_ERROR);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn apply_overrides(mut config: CliConfig, cli: &Cli) -> CliConfig {
    let mut inner = config.inner;

    if let Some(root) = &cli.sdk_root {
        inner = inner.with_sdk_root(root.clone());
    }
    if !cli.sources.is_empty() {
        inner = inner.with_sources(cli.sources.clone());
    }
    if cli.include_obsoletes {
        inner = inner.with_include_obsoletes(true);
    }
    if cli.force_http {
        inner = inner.with_force_http(true);
    }
    if cli.verbose {
        inner = inner.with_verbosity(Verbosity::Verbose);
    }

    config.inner = inner;
    config
}

fn output_error(cli: &Cli, msg: &str) {
    if cli.json {
        let output: JsonOutput<()> = JsonOutput::err(msg);
        match serde_json::to_string(&output) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("error: {msg}"),
        }
    } else {
        eprintln!("{} {msg}", ansi::bold("error:"));
    }
}

fn print_json<T: serde::Serialize>(data: T) -> Result<(), libsdk_updater::Error> {
    let output = JsonOutput::ok(data);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cmd_check(
    cli: &Cli,
    config: &CliConfig,
    suggest_new: bool,
) -> Result<i32, libsdk_updater::Error> {
    let inner = config
        .inner
        .clone()
        .with_suggest_new(suggest_new || config.suggest_new);
    let result = check_updates(&inner)?;
    report_plan(cli, config.verbosity, result, "no updates available")
}

fn cmd_plan(
    cli: &Cli,
    config: &CliConfig,
    filters: &[String],
) -> Result<i32, libsdk_updater::Error> {
    let result = plan_for(&config.inner, filters)?;
    report_plan(cli, config.verbosity, result, "nothing to install")
}

fn report_plan(
    cli: &Cli,
    verbosity: Verbosity,
    mut result: CheckResult,
    empty_message: &str,
) -> Result<i32, libsdk_updater::Error> {
    result.plan.accept_all();
    let code = if result.has_blocked() {
        exit_codes::BLOCKED
    } else {
        exit_codes::SUCCESS
    };

    if cli.json {
        print_json(PlanSummary::from(&result))?;
        return Ok(code);
    }

    if verbosity != Verbosity::Quiet {
        print_source_failures(&result.failed_sources);
    }

    if result.plan.is_empty() {
        if verbosity != Verbosity::Quiet {
            println!("{} {empty_message}", ansi::bold("info:"));
        }
        return Ok(code);
    }

    let summary = PlanSummary::from(&result);

    if verbosity == Verbosity::Quiet {
        println!("{}", summary.entries.len());
        return Ok(code);
    }

    println!(
        "{} {} archive(s) to install:",
        ansi::bold("info:"),
        summary.entries.len()
    );
    println!();
    print_plan_table(&summary.entries, verbosity);

    if !summary.missing.is_empty() {
        println!();
        println!(
            "{} {} dependency(ies) cannot be satisfied:",
            ansi::bold("warn:"),
            summary.missing.len()
        );
        for missing in &summary.missing {
            println!("  - {missing}");
        }
    }

    Ok(code)
}

fn cmd_list_installed(cli: &Cli, config: &CliConfig) -> Result<i32, libsdk_updater::Error> {
    let packages = list_installed(&config.inner)?;
    let entries: Vec<PackageEntry> = packages.iter().map(|p| PackageEntry::from(&**p)).collect();

    if cli.json {
        print_json(&entries)?;
        return Ok(exit_codes::SUCCESS);
    }

    if entries.is_empty() {
        if config.verbosity != Verbosity::Quiet {
            println!(
                "{} no packages installed in {}",
                ansi::bold("info:"),
                config.sdk_root.display()
            );
        }
        return Ok(exit_codes::SUCCESS);
    }

    if config.verbosity == Verbosity::Quiet {
        println!("{}", entries.len());
    } else {
        println!(
            "{} {} installed package(s):",
            ansi::bold("info:"),
            entries.len()
        );
        println!();
        print_packages_table(&entries, config.verbosity);
    }

    Ok(exit_codes::SUCCESS)
}

fn cmd_list_remote(cli: &Cli, config: &CliConfig) -> Result<i32, libsdk_updater::Error> {
    let (packages, failures) = list_remote(&config.inner)?;
    let entries: Vec<PackageEntry> = packages.iter().map(|p| PackageEntry::from(&**p)).collect();

    if cli.json {
        print_json(&entries)?;
        return Ok(exit_codes::SUCCESS);
    }

    if config.verbosity != Verbosity::Quiet {
        print_source_failures(&failures);
    }

    if entries.is_empty() {
        if config.verbosity != Verbosity::Quiet {
            println!("{} no remote packages available", ansi::bold("info:"));
        }
        return Ok(exit_codes::SUCCESS);
    }

    if config.verbosity == Verbosity::Quiet {
        println!("{}", entries.len());
    } else {
        println!(
            "{} {} remote package(s):",
            ansi::bold("info:"),
            entries.len()
        );
        println!();
        print_packages_table(&entries, config.verbosity);
    }

    Ok(exit_codes::SUCCESS)
}

fn name_width<T>(items: &[T], name: impl Fn(&T) -> &str) -> usize {
    items
        .iter()
        .map(|i| name(i).len())
        .max()
        .unwrap_or(11)
        .max(11)
}

fn print_plan_table(entries: &[PlanEntry], verbosity: Verbosity) {
    let width = name_width(entries, |e| &e.description);

    println!("{:<width$}  {:>7}  {:>4}", "DESCRIPTION", "STATUS", "AUTO");
    println!("{}", "-".repeat(width + 15));

    for entry in entries {
        let status = if entry.blocked { "blocked" } else { "ok" };
        let auto = if entry.automated { "yes" } else { "" };
        println!("{:<width$}  {:>7}  {:>4}", entry.description, status, auto);

        if verbosity == Verbosity::Verbose {
            if let Some(replaces) = &entry.replaces {
                println!("    replaces {replaces}");
            }
            for dependency in &entry.depends_on {
                println!("    depends on {dependency}");
            }
            if let Some(url) = &entry.url {
                println!("    from {url}");
            }
        }
    }
}

fn print_packages_table(entries: &[PackageEntry], verbosity: Verbosity) {
    let width = name_width(entries, |e| &e.description);

    if verbosity == Verbosity::Verbose {
        println!("{:<width$}  {:<14}  SOURCE", "DESCRIPTION", "KIND");
        println!("{}", "-".repeat(width + 40));

        for e in entries {
            println!(
                "{:<width$}  {:<14}  {}",
                e.description,
                e.kind,
                e.source.as_deref().unwrap_or("-")
            );
        }
    } else {
        println!("{:<width$}  {:<14}", "DESCRIPTION", "KIND");
        println!("{}", "-".repeat(width + 16));

        for e in entries {
            println!("{:<width$}  {:<14}", e.description, e.kind);
        }
    }
}

fn print_source_failures(failures: &[SourceFailure]) {
    if failures.is_empty() {
        return;
    }

    println!(
        "{} {} source(s) could not be loaded:",
        ansi::bold("warn:"),
        failures.len()
    );
    for failure in failures {
        println!("  - {}: {}", failure.url, failure.reason);
    }
    println!();
}
