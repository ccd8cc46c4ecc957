use anyhow::Result;
use clap::Parser;

use loyalty::cli::{AnalyzeArgs, Cli, Commands, GenerateArgs, OutputFormat};
use loyalty::config::{AnalysisConfig, Settings};
use loyalty::config_file::ConfigFile;
use loyalty::generator::generate_log_files;
use loyalty::logging::init_logging;
use loyalty::platform::{ExitCode, Interrupted, SafeStdout, SignalHandler};
use loyalty::runner::{AnalysisError, Analyzer};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("loyalty: Error: {:#}", e);
        ExitCode::GeneralError.exit();
    }

    let code = match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::Generate(args) => run_generate(&args),
    };
    code.exit();
}

fn run_analyze(args: &AnalyzeArgs) -> ExitCode {
    let config = match build_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("loyalty: Error: {:#}", e);
            return ExitCode::InvalidUsage;
        }
    };
    tracing::debug!(?config, "effective configuration");

    let analyzer = Analyzer::new(config);
    let ctx = analyzer.context();

    let signal_handler = match SignalHandler::new(ctx.clone()) {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("Failed to initialize signal handling: {}", e);
            return ExitCode::GeneralError;
        }
    };

    let report = match analyzer.run(&args.day1, &args.day2, &ctx) {
        Ok(report) => report,
        Err(e) => return report_failure(&e, analyzer.config(), &signal_handler),
    };

    if args.stats {
        eprintln!("{}", report.stats.format_stats());
    }

    let mut stdout = SafeStdout::new();
    let written = match args.output_format {
        OutputFormat::Default => report
            .format_lines()
            .iter()
            .try_for_each(|line| stdout.writeln(line)),
        OutputFormat::Json => stdout.writeln(&report.to_json().to_string()),
    }
    .and_then(|()| stdout.flush());

    match written {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("loyalty: Error: {:#}", e);
            ExitCode::GeneralError
        }
    }
}

/// Layer config files and command-line flags over the built-in defaults.
fn build_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut layers: Vec<Settings> = Vec::new();

    if !args.ignore_config {
        let file = ConfigFile::load_with_custom_path(args.config_file.as_deref())?;
        for source in &file.sources {
            tracing::info!(path = %source.display(), "using config file");
        }
        layers.push(file.analyze);
    }
    layers.push(args.to_settings());

    Ok(AnalysisConfig::from_settings(&layers)?)
}

fn report_failure(
    error: &AnalysisError,
    config: &AnalysisConfig,
    signals: &SignalHandler,
) -> ExitCode {
    match error.interrupted() {
        Some(Interrupted::DeadlineExceeded) => {
            match config.timeout {
                Some(timeout) => eprintln!(
                    "loyalty: Error: timed out after {}",
                    humantime::format_duration(timeout)
                ),
                None => eprintln!("loyalty: Error: timed out"),
            }
            ExitCode::Timeout
        }
        Some(Interrupted::Cancelled) => {
            eprintln!("loyalty: Interrupted");
            signals.exit_code()
        }
        None => {
            eprintln!("loyalty: Error: {}", error);
            ExitCode::GeneralError
        }
    }
}

fn run_generate(args: &GenerateArgs) -> ExitCode {
    match generate_log_files(&args.out_dir, &args.to_config()) {
        Ok(logs) => {
            let mut stdout = SafeStdout::new();
            let written = stdout
                .writeln(&logs.day1.display().to_string())
                .and_then(|()| stdout.writeln(&logs.day2.display().to_string()))
                .and_then(|()| stdout.flush());
            if let Err(e) = written {
                eprintln!("loyalty: Error: {:#}", e);
                return ExitCode::GeneralError;
            }
            tracing::info!(planted = logs.loyal_users.len(), "planted loyal users");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("loyalty: Error: {:#}", e);
            ExitCode::GeneralError
        }
    }
}
