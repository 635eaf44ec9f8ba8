//!
//! statsclause CLI binary
//! ----------------------
//! Parses query text (SQL-like or piped) and prints the extracted aggregations
//! and group-by structure, either as tables or as JSON. In REPL mode each
//! input line is parsed as one query.

use std::env;
use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use statsclause::cli::{emit_stats_clause, require_query_text, wants_json};
use statsclause::error::AppError;
use statsclause::query::parse_stats_clause;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} --query \"<QUERY>\" [--json]\n  {program} -q \"<QUERY>\" [--json]\n  {program} [--json]            # reads query text from stdin\n  {program} --repl [--json]     # start interactive interpreter\n\nFlags:\n  -q, --query <QUERY>      Parse a one-shot query (from arg); if omitted, reads from stdin\n  --json                   Print the parsed clause as JSON instead of tables\n  --repl                   Start interactive mode\n  -h, --help               Show this help\n\nInteractive commands:\n  help                     show this help\n  quit | exit              exit the interpreter\n  <QUERY>                  parse the line and print its stats clause\n\nEnvironment:\n  RUST_LOG                 tracing filter (default: info)\n  STATSCLAUSE_OUTPUT=json  always print JSON\n\nExamples:\n  {program} -q \"select count(*), avg(bytes) as b from logs group by span(timestamp, 1h), host\"\n  {program} --json -q \"source=accounts | stats count() by gender\""
    );
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to build log filter")?;
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();

    let mut args: Vec<String> = env::args().collect();
    let program = if args.is_empty() { "statsclause".to_string() } else { args.remove(0) };

    let mut query: Option<String> = None;
    let mut repl = false;
    let mut json_flag = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--query" | "-q" => {
                if i + 1 >= args.len() { eprintln!("--query requires a value"); print_usage(&program); std::process::exit(2); }
                query = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--repl" => { repl = true; i += 1; continue; }
            "--json" => { json_flag = true; i += 1; continue; }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            unk => {
                // Allow passing query without flag as a single arg
                if query.is_none() && !unk.starts_with("--") { query = Some(unk.to_string()); i += 1; continue; }
                eprintln!("Unrecognized argument: {}", unk);
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    let json = wants_json(json_flag);
    debug!(target: "statsclause", "cli options: repl={}, json={}, query_from_args={}", repl, json, query.is_some());

    if repl {
        return run_repl(&program, json);
    }

    let text = match query {
        Some(q) => q,
        None => {
            let mut buf = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buf) {
                exit_with(AppError::from(e));
            }
            buf
        }
    };

    let qtext = match require_query_text(&text) {
        Ok(t) => t,
        Err(e) => {
            print_usage(&program);
            exit_with(e);
        }
    };
    let clause = parse_stats_clause(qtext);
    info!(target: "statsclause", "parsed {} aggregation(s), {} group field(s)", clause.aggregations.len(), clause.group_by.fields.len());
    if let Err(e) = emit_stats_clause(&clause, json) {
        exit_with(e);
    }
    Ok(())
}

fn exit_with(err: AppError) -> ! {
    eprintln!("error: {}", err);
    std::process::exit(err.exit_code());
}

fn run_repl(program: &str, json: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();
    println!("statsclause interpreter. Type 'help' for commands.");
    loop {
        input.clear();
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;
        match stdin.read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => { eprintln!("error: {}", AppError::from(e)); break; }
        }
        let line = input.trim();
        if line.is_empty() { continue; }
        let up = line.to_uppercase();
        if up == "EXIT" || up == "QUIT" { break; }
        if up == "HELP" { print_usage(program); continue; }
        let clause = parse_stats_clause(line);
        if let Err(e) = emit_stats_clause(&clause, json) {
            eprintln!("error: {}", e);
        }
    }
    Ok(())
}
