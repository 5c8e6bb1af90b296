use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use cutoff_aggregator::writer::{write_csv, write_workbook};
use cutoff_aggregator::{discover_inputs, Authority, CalamineReader, Config, Pipeline, RunOutcome, WideTable};
use std::fs;
use std::path::{Path, PathBuf};

const RECONCILED_TAB: &str = "AGGREGATED";

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let matches = Command::new("cutoff-aggregator")
        .version("0.1")
        .about("Aggregates KCET/COMEDK cutoff ranks per college and reconciles admission rounds")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("authority")
                .short('a')
                .long("authority")
                .value_name("AUTHORITY")
                .value_parser(["kcet", "comedk"])
                .help("Override the authority layout from the configuration"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output workbook (defaults to output_directory/output_file)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .arg(
            Arg::new("inputs")
                .value_name("INPUT")
                .num_args(0..)
                .help("Round workbooks, earliest first (defaults to the configured inputs)"),
        )
        .get_matches();

    init_logging(matches.get_count("verbose"));

    let config_file = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");
    let authority_override = matches
        .get_one::<String>("authority")
        .map(|a| a.parse::<Authority>())
        .transpose()
        .map_err(anyhow::Error::msg)?;

    // Load or create configuration
    let mut config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)
            .with_context(|| format!("Failed to load configuration {}", config_file))?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::for_authority(authority_override.unwrap_or(Authority::Kcet));
        default_config.save_to_file(config_file)?;
        println!(
            "⚠️  Please edit {} (catalog file, data directory, institution tokens) and run the program again.",
            config_file
        );
        return Ok(());
    };

    if let Some(authority) = authority_override {
        config.set_authority(authority);
    }

    let inputs: Vec<PathBuf> = match matches.get_many::<String>("inputs") {
        Some(values) => values.map(PathBuf::from).collect(),
        None => discover_inputs(&config)
            .with_context(|| format!("Failed to list workbooks in {}", config.data_dir()))?,
    };
    let output_path = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.output_path());

    println!("🏛️  Authority: {}", config.authority);
    println!("📚 Course catalog: {}", config.catalog_file);

    let write_csv_copy = config.write_csv;
    let pipeline = Pipeline::new(config, CalamineReader).context("Failed to load the course catalog")?;

    let interested: Vec<String> = pipeline
        .catalog()
        .interested()
        .map(|course| course.code.clone())
        .collect();
    if interested.is_empty() {
        println!("⚠️  No course is flagged as interesting in the catalog, nothing will be extracted");
    } else {
        println!("🎯 Programs of interest: {}", interested.join(", "));
    }

    if inputs.is_empty() {
        println!("❌ No workbooks found in {}", pipeline.config().data_dir());
        return Ok(());
    }
    for input in &inputs {
        println!("📄 Round: {}", input.display());
    }

    let outcome = pipeline.run(&inputs).context("Aggregation failed")?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tabs: Vec<(&str, &WideTable)> = vec![(RECONCILED_TAB, &outcome.reconciled)];
    tabs.extend(outcome.sources.iter().map(|s| (s.name.as_str(), &s.table)));
    write_workbook(&output_path, &tabs)?;

    if write_csv_copy {
        let csv_path = output_path.with_extension("csv");
        write_csv(&csv_path, &outcome.reconciled)?;
        println!("📄 CSV copy: {}", csv_path.display());
    }

    print_summary(&outcome);

    println!("\n✅ Aggregation complete!");
    println!("📂 Results: {}", output_path.display());
    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    println!("\n📊 SUMMARY");
    println!("==========\n");

    for source in &outcome.sources {
        println!(
            "   ✅ {} ({}): {} colleges, {} programs",
            source.name,
            source.path.display(),
            source.table.len(),
            source.table.program_columns().len()
        );
    }

    let filled: usize = outcome
        .reconciled
        .rows()
        .iter()
        .map(|row| row.cells.len())
        .sum();
    println!(
        "\n📈 Reconciled: {} colleges x {} programs ({} cutoffs)",
        outcome.reconciled.len(),
        outcome.reconciled.program_columns().len(),
        filled
    );

    if !outcome.warnings.is_empty() {
        println!("\n⚠️  {} source(s)/sheet(s) skipped:", outcome.warnings.len());
        for warning in &outcome.warnings {
            println!("   - {}", warning);
        }
    }
}
