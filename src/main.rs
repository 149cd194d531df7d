//! Command line interface for the MONAD solver

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use monad_solver::{
    config::{load_program, CliOverrides, Settings},
    monad::{CoefficientTable, Program},
    search::{solve_both, SolutionValidator},
    utils::{ColorOutput, SolutionFormatter},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/default.yaml";

#[derive(Parser)]
#[command(name = "monad_solver")]
#[command(about = "Finds the largest and smallest model numbers accepted by MONAD")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the largest and smallest accepted model numbers
    Solve {
        /// Configuration file path
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// ALU program to extract coefficients from (overrides config)
        #[arg(short, long)]
        program: Option<PathBuf>,

        /// Per-run timeout in seconds (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Run maximization and minimization in parallel
        #[arg(long)]
        parallel: bool,

        /// Print the answers as JSON
        #[arg(long)]
        json: bool,

        /// Print encoding and solve statistics to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check a candidate model number
    Check {
        /// The 14-digit candidate
        digits: String,

        /// ALU program to replay the candidate through
        #[arg(short, long)]
        program: Option<PathBuf>,
    },

    /// Print the coefficient table extracted from an ALU program
    Extract {
        /// ALU program file
        #[arg(short, long)]
        program: PathBuf,
    },

    /// Create the default configuration and the canonical ALU program
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", ColorOutput::error(&format!("error: {:#}", err)));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        None => {
            solve_command(PathBuf::from(DEFAULT_CONFIG), CliOverrides::default(), false)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Solve {
            config,
            program,
            timeout,
            parallel,
            json,
            verbose,
        }) => {
            let overrides = CliOverrides {
                timeout_seconds: timeout,
                parallel,
                program_file: program,
                json,
            };
            solve_command(config, overrides, verbose)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Check { digits, program }) => {
            let valid = check_command(&digits, program.as_deref())?;
            Ok(if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Some(Commands::Extract { program }) => {
            extract_command(&program)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Setup { directory, force }) => {
            setup_command(&directory, force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn solve_command(config_path: PathBuf, overrides: CliOverrides, verbose: bool) -> Result<()> {
    let mut settings = Settings::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    settings.merge_with_cli(&overrides);
    settings
        .validate()
        .context("Configuration validation failed")?;

    let table = settings.coefficient_table()?;
    let options = settings.optimizer_options();
    if verbose {
        eprintln!("{}", ColorOutput::info("Coefficient table:"));
        eprint!("{}", SolutionFormatter::format_table(&table));
        eprintln!(
            "Timeout: {}, CaDiCaL: {}, parallel: {}",
            options
                .timeout
                .map(|t| format!("{}s", t.as_secs()))
                .unwrap_or_else(|| "none".to_string()),
            options.cadical_config,
            options.parallel
        );
    }

    let start_time = Instant::now();
    let answers = solve_both(&table, &options).context("Failed to find the model numbers")?;
    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "solved both directions"
    );

    println!(
        "{}",
        SolutionFormatter::format_answers(&answers, settings.output.format)?
    );

    if verbose {
        eprint!("{}", SolutionFormatter::format_solution(&answers.maximum));
        eprint!("{}", SolutionFormatter::format_solution(&answers.minimum));
        eprintln!(
            "{}",
            ColorOutput::success(&format!(
                "Solved in {:.3}s",
                start_time.elapsed().as_secs_f64()
            ))
        );
    }

    Ok(())
}

/// Print the validation report; `Ok(false)` when the candidate is rejected
fn check_command(digits: &str, program_path: Option<&Path>) -> Result<bool> {
    let validator = match program_path {
        Some(path) => {
            let program = load_program(path)?;
            let table = program
                .extract_coefficients()
                .with_context(|| format!("Failed to extract coefficients from {}", path.display()))?;
            SolutionValidator::new(table).with_program(program)
        }
        None => SolutionValidator::new(CoefficientTable::puzzle()),
    };

    let result = validator.check(digits);
    print!("{}", result);
    if result.is_valid {
        eprintln!("{}", ColorOutput::success("Model number is accepted"));
    } else {
        eprintln!("{}", ColorOutput::error("Model number is rejected"));
    }
    Ok(result.is_valid)
}

fn extract_command(program_path: &Path) -> Result<()> {
    let table = load_program(program_path)?
        .extract_coefficients()
        .with_context(|| {
            format!(
                "Failed to extract coefficients from {}",
                program_path.display()
            )
        })?;
    print!("{}", SolutionFormatter::format_table(&table));
    Ok(())
}

fn setup_command(directory: &Path, force: bool) -> Result<()> {
    let config_path = directory.join(DEFAULT_CONFIG);
    if !config_path.exists() || force {
        Settings::default()
            .to_file(&config_path)
            .context("Failed to create default configuration")?;
        eprintln!("Created: {}", config_path.display());
    } else {
        eprintln!(
            "{}",
            ColorOutput::warning(&format!("Skipped: {} (already exists)", config_path.display()))
        );
    }

    let input_dir = directory.join("input");
    std::fs::create_dir_all(&input_dir)
        .with_context(|| format!("Failed to create directory {}", input_dir.display()))?;
    let program_path = input_dir.join("monad.txt");
    if !program_path.exists() || force {
        let program = Program::from_table(&CoefficientTable::puzzle());
        std::fs::write(&program_path, program.to_string())
            .with_context(|| format!("Failed to write {}", program_path.display()))?;
        eprintln!("Created: {}", program_path.display());
    } else {
        eprintln!(
            "{}",
            ColorOutput::warning(&format!("Skipped: {} (already exists)", program_path.display()))
        );
    }

    eprintln!("{}", ColorOutput::success("Setup complete!"));
    eprintln!(
        "Next: monad_solver solve --program {}",
        program_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "monad_solver",
            "solve",
            "--config",
            "test.yaml",
            "--timeout",
            "5",
            "--json",
        ]);
        assert!(cli.is_ok());

        let bare = Cli::try_parse_from(["monad_solver"]).unwrap();
        assert!(bare.command.is_none());

        assert!(Cli::try_parse_from(["monad_solver", "check", "99199996849497"]).is_ok());
        assert!(Cli::try_parse_from(["monad_solver", "extract"]).is_err());
    }

    #[test]
    fn test_setup_command() {
        let temp_dir = tempdir().unwrap();
        setup_command(temp_dir.path(), false).unwrap();

        let config_path = temp_dir.path().join("config/default.yaml");
        let program_path = temp_dir.path().join("input/monad.txt");
        assert!(config_path.exists());
        assert!(program_path.exists());

        assert_eq!(Settings::from_file(&config_path).unwrap(), Settings::default());
        let table = load_program(&program_path)
            .unwrap()
            .extract_coefficients()
            .unwrap();
        assert_eq!(table, CoefficientTable::puzzle());
    }

    #[test]
    fn test_setup_respects_existing_files() {
        let temp_dir = tempdir().unwrap();
        let program_path = temp_dir.path().join("input/monad.txt");
        std::fs::create_dir_all(program_path.parent().unwrap()).unwrap();
        std::fs::write(&program_path, "inp w\n").unwrap();

        setup_command(temp_dir.path(), false).unwrap();
        assert_eq!(std::fs::read_to_string(&program_path).unwrap(), "inp w\n");

        setup_command(temp_dir.path(), true).unwrap();
        assert!(std::fs::read_to_string(&program_path).unwrap().len() > 1000);
    }

    #[test]
    fn test_check_command() {
        let temp_dir = tempdir().unwrap();
        setup_command(temp_dir.path(), false).unwrap();
        let program_path = temp_dir.path().join("input/monad.txt");

        assert!(check_command("99199996849497", Some(&program_path)).unwrap());
        assert!(!check_command("13579246899999", Some(&program_path)).unwrap());
        assert!(!check_command("0000", None).unwrap());
    }

    #[test]
    fn test_extract_command_rejects_malformed_program() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bad.txt");
        std::fs::write(&path, "inp w\nadd z w\n").unwrap();
        assert!(extract_command(&path).is_err());
    }
}
