use anyhow::{Context, Result};
use clap::Parser;
use covgate::cli::{Cli, CollectArgs, Command, ExtractArgs, HtmlArgs, LcovArgs};
use covgate::commands::html::{generate_html, HtmlOptions};
use covgate::commands::lcov::{generate_lcov, LcovOptions};
use covgate::config::CoverageConfig;
use covgate::error::CoverageError;
use covgate::executor::{CoverageExecutor, GrcovExecutor};
use covgate::filter::SymbolFilter;
use covgate::process::SystemRunner;
use covgate::session::CoverageSession;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<CoverageConfig> {
    match path {
        Some(path) => CoverageConfig::from_toml(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(CoverageConfig::default()),
    }
}

fn run_lcov(args: LcovArgs, config: &CoverageConfig, verbose: bool) -> Result<i32, CoverageError> {
    let runner = SystemRunner::with_timeout(config.timeout());
    let options = LcovOptions {
        bin_dirs: args.bin_dirs,
        output_dir: args.output_dir,
        output_filename: args.output_filename,
        output_type: args.output_type,
        not_llvm: args.not_llvm,
        verbose,
    };
    let output = generate_lcov(&runner, config, &options)?;
    println!("Created '{}'", output.display());
    Ok(0)
}

fn run_html(args: HtmlArgs, config: &CoverageConfig, verbose: bool) -> Result<i32, CoverageError> {
    let runner = SystemRunner::with_timeout(config.timeout());
    let options = HtmlOptions {
        bin_dir: args.bin_dir,
        profraw_filename: args.profraw_filename,
        profdata_filename: args.profdata_filename,
        executables: args.executables,
        source_dirs: args.source_dirs,
        output_filename: args.output_filename,
        force: args.force,
        no_sparse: args.no_sparse,
        verbose,
    };
    let output = generate_html(&runner, config, &options)?;
    println!("Created '{}'", output.display());
    Ok(0)
}

fn run_extract(
    args: ExtractArgs,
    config: CoverageConfig,
    verbose: bool,
) -> Result<i32, CoverageError> {
    let executor = GrcovExecutor::system(config).verbose(verbose);
    let filter = SymbolFilter::from_globs(args.includes.as_slice(), args.excludes.as_slice());
    let result = executor.extract_coverage_info(&args.binary, &filter)?;

    if args.json {
        let json = serde_json::json!({
            "binary": args.binary.display().to_string(),
            "units": executor.units(),
            "covered": result.covered,
            "not_covered": result.not_covered,
            "percentage": result.percentage(),
        });
        println!("{}", json);
    } else {
        println!(
            "{}: {} of {} {} covered ({:.2}%)",
            args.binary.display(),
            result.covered,
            result.total(),
            executor.units(),
            result.percentage()
        );
    }

    match args.min_coverage {
        Some(min) if !result.meets(min) => {
            eprintln!(
                "Coverage {:.2}% is below the required {:.2}%",
                result.percentage(),
                min
            );
            Ok(1)
        }
        _ => Ok(0),
    }
}

fn run_collect(
    args: CollectArgs,
    config: CoverageConfig,
    verbose: bool,
) -> Result<i32, CoverageError> {
    let executor = GrcovExecutor::system(config).verbose(verbose);
    let mut session = CoverageSession::new();
    for binary in &args.binaries {
        executor.preprocess_binary(&mut session, binary)?;
    }
    executor.start_coverage(&mut session, &args.output)?;
    executor.stop_coverage(session)?;
    println!("Created '{}'", args.output.display());
    Ok(0)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(cli.debug);

    let config = load_config(cli.config.as_deref())?;
    let verbose = cli.verbose;
    let report_results = matches!(cli.command, Command::Lcov(_) | Command::Html(_));

    let outcome = match cli.command {
        Command::Lcov(args) => run_lcov(args, &config, verbose),
        Command::Html(args) => run_html(args, &config, verbose),
        Command::Extract(args) => run_extract(args, config, verbose),
        Command::Collect(args) => run_collect(args, config, verbose),
    };

    let code = match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    if report_results {
        eprintln!("Results: {}", if code == 0 { "DONE!" } else { "FAILED" });
    }
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
