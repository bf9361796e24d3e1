//! subsheet CLI - evaluate formulas and recalculate small sheets

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use subsheet::formula::lexer::Lexer;
use subsheet::prelude::*;
use subsheet::{parse_formula, FORMULA_SIGIL};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "subsheet")]
#[command(author, version, about = "Formula evaluation and sheet recalculation tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Number of grid rows
    #[arg(long, global = true, default_value_t = subsheet::DEFAULT_ROWS)]
    rows: u32,

    /// Number of grid columns
    #[arg(long, global = true, default_value_t = subsheet::DEFAULT_COLS)]
    cols: u32,

    /// Ceiling for nested cell reads during evaluation
    #[arg(long, global = true, default_value_t = CalculationOptions::default().max_depth)]
    max_depth: usize,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula and print its display text
    Eval {
        /// Formula text (the leading `=` is optional)
        formula: String,

        /// Cell the formula is placed in
        #[arg(long, default_value = "A1")]
        at: String,

        /// Other cell contents (ADDR=content)
        #[arg(short = 'c', long = "cell", value_name = "ADDR=CONTENT")]
        cells: Vec<String>,
    },

    /// Print the tokens of a formula
    Tokens {
        /// Formula text (the leading `=` is optional)
        formula: String,
    },

    /// Print the parsed expression tree of a formula
    Ast {
        /// Formula text (the leading `=` is optional)
        formula: String,
    },

    /// Load a sheet, recalculate it and print every non-empty cell
    Run {
        /// Sheet file: one `ADDR content` per line, `#` starts a comment
        file: Option<PathBuf>,

        /// Additional cell contents (ADDR=content), applied after the file
        #[arg(short = 'c', long = "cell", value_name = "ADDR=CONTENT")]
        cells: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let options = CalculationOptions {
        max_depth: cli.max_depth,
    };

    match cli.command {
        Commands::Eval { formula, at, cells } => {
            let mut sheet = Worksheet::new(cli.rows, cli.cols);
            apply_assignments(&mut sheet, &cells)?;
            eval_formula(&mut sheet, &formula, &at, &options)
        }
        Commands::Tokens { formula } => print_tokens(&formula),
        Commands::Ast { formula } => print_ast(&formula),
        Commands::Run { file, cells } => {
            let mut sheet = Worksheet::new(cli.rows, cli.cols);
            if let Some(path) = file {
                load_sheet(&mut sheet, &path)?;
            }
            apply_assignments(&mut sheet, &cells)?;
            run_sheet(&mut sheet, &options)
        }
    }
}

fn eval_formula(
    sheet: &mut Worksheet,
    formula: &str,
    at: &str,
    options: &CalculationOptions,
) -> Result<()> {
    let address = CellAddress::parse(at).with_context(|| format!("Invalid cell address '{}'", at))?;

    let content = if formula.starts_with(FORMULA_SIGIL) {
        formula.to_string()
    } else {
        format!("{}{}", FORMULA_SIGIL, formula)
    };
    sheet
        .set_content_at(address, content)
        .with_context(|| format!("Cell {} is outside the grid", address))?;

    sheet
        .calculate_with_options(options)
        .context("Failed to calculate formulas")?;

    println!("{}", sheet.display_text_at(address)?);
    Ok(())
}

fn print_tokens(formula: &str) -> Result<()> {
    let source = formula.strip_prefix(FORMULA_SIGIL).unwrap_or(formula);
    let (tokens, error) = Lexer::new(source).scan();

    let mut out = io::stdout().lock();
    for token in &tokens {
        writeln!(out, "{:?}\t{}", token.kind, token.lexeme).context("Failed to write to stdout")?;
    }

    if let Some(e) = error {
        writeln!(out, "error\t#{}", e.code()).context("Failed to write to stdout")?;
    }
    Ok(())
}

fn print_ast(formula: &str) -> Result<()> {
    let ast = parse_formula(formula).with_context(|| format!("Failed to parse '{}'", formula))?;
    println!("{}", ast);
    Ok(())
}

fn run_sheet(sheet: &mut Worksheet, options: &CalculationOptions) -> Result<()> {
    let stats = sheet
        .calculate_with_options(options)
        .context("Failed to calculate formulas")?;

    info!(
        formulas = stats.formula_count,
        calculated = stats.cells_calculated,
        errors = stats.errors,
        circular = stats.circular_references,
        "recalculated sheet"
    );

    let mut out = io::stdout().lock();
    for (address, cell) in sheet.non_empty_cells() {
        writeln!(out, "{}\t{}", address, cell.display()).context("Failed to write to stdout")?;
    }
    Ok(())
}

/// Load `ADDR content` lines into the sheet
fn load_sheet(sheet: &mut Worksheet, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.trim_start().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let (address, content) = match line.split_once(|c: char| c == ' ' || c == '\t') {
            Some((address, content)) => (address, content.trim_start()),
            None => (line, ""),
        };

        sheet.set_cell(address, content).with_context(|| {
            format!("{}:{}: invalid cell '{}'", path.display(), number + 1, address)
        })?;
    }

    Ok(())
}

/// Apply `ADDR=content` assignments from the command line
fn apply_assignments(sheet: &mut Worksheet, assignments: &[String]) -> Result<()> {
    for assignment in assignments {
        let (address, content) = assignment.split_once('=').with_context(|| {
            format!("Invalid cell assignment '{assignment}'. Expected ADDR=CONTENT format")
        })?;

        sheet
            .set_cell(address.trim(), content)
            .with_context(|| format!("Invalid cell '{}'", address))?;
    }

    Ok(())
}
