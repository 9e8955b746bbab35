use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use std::path::Path;

use x86lite_inspect::{analyze_entries, load_source, render_listing, symbol_rows, Report};

#[derive(Parser, Debug)]
#[command(author, version, about = "x86lite program inspector", long_about=None)]
struct Cli {
    /// Input assembly source
    #[arg(value_name = "SOURCE")]
    input: String,
    /// Subcommand
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the symbol table built by the loader
    Symbols {
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the cleaned instruction stream with labels
    Listing {
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
    /// Control-flow analysis from entry lines
    Analyze {
        /// Entry labels or line numbers. Repeat to add more; defaults to line 0.
        #[arg(long = "entry", value_name = "LABEL|LINE", num_args = 1.., required = false)]
        entries: Vec<String>,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write analysis output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat { Text, Json }

fn emit(out: Option<String>, buf: String) -> Result<()> {
    if let Some(path) = out { std::fs::write(path, buf)?; } else { print!("{}", buf); }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let program = load_source(Path::new(&cli.input))?;

    match cli.cmd {
        Command::Symbols { format } => {
            let rows = symbol_rows(&program.symbols);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Text => {
                    println!("{:<20} {:<6} value", "name", "kind");
                    for r in &rows {
                        println!("{:<20} {:<6} {}", r.name, r.kind, r.value);
                    }
                    if let Some(entry) = &program.entry {
                        println!("entry: {entry}");
                    }
                }
            }
        }
        Command::Listing { out } => emit(out, render_listing(&program))?,
        Command::Analyze { entries, format, out } => {
            let mut seeds: Vec<usize> = Vec::new();
            for e in &entries {
                let line = match e.parse::<usize>() {
                    Ok(n) => n,
                    Err(_) => program
                        .symbols
                        .label(e)
                        .ok_or_else(|| anyhow::anyhow!("no such label: {e}"))?,
                };
                seeds.push(line);
            }
            if seeds.is_empty() { seeds.push(0); }
            seeds.sort_unstable();
            seeds.dedup();

            let analysis = analyze_entries(&program, &seeds);
            let report = Report::new(&seeds, &analysis);
            match format {
                OutputFormat::Json => emit(out, serde_json::to_string_pretty(&report)? + "\n")?,
                OutputFormat::Text => {
                    use std::fmt::Write as _;
                    let mut buf = String::new();
                    let _ = writeln!(buf, "Analysis summary:");
                    let _ = writeln!(buf, "  entries    : {:?}", report.entries);
                    let _ = writeln!(buf, "  reachable  : {}", report.reachable.len());
                    let _ = writeln!(buf, "  edges      : {}", report.edges.len());
                    let _ = writeln!(buf, "  terminates : {}", report.terminates);
                    let _ = writeln!(buf, "  falls off  : {}", report.falls_off);
                    let _ = writeln!(buf, "Edges:");
                    for e in &report.edges {
                        let _ = writeln!(buf, "  {:>5} -> {:>5} ({})", e.from, e.to, e.kind);
                    }
                    for u in &report.unresolved {
                        let _ = writeln!(buf, "unresolved label `{}` at line {}", u.label, u.line);
                    }
                    emit(out, buf)?;
                }
            }
        }
    }
    Ok(())
}
