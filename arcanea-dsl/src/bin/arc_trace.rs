/// Arc Tracer - Shows the flow through Lexer → Parser → Pretty printer
///
/// Usage: cargo run --bin arc_trace [--lenient] <file.arc>
///
/// Set `RUST_LOG=arcanea_dsl=debug` to see recovery decisions.
use arcanea_dsl::{pretty_print, LexMode, Lexer, Parser};
use std::fs;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let lenient = args.iter().any(|a| a == "--lenient");
    let Some(path) = args.iter().find(|a| !a.starts_with("--")) else {
        eprintln!("Usage: cargo run --bin arc_trace [--lenient] <file.arc>");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin arc_trace spells/fire.arc");
        std::process::exit(1);
    };

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ ARC PARSER TRACER");
    println!("╚═══════════════════════════════════════════════════════════════\n");

    let source = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let mode = if lenient { LexMode::Lenient } else { LexMode::Strict };

    println!("🔤 TOKENS ({:?}):", mode);
    println!("─────────────────────────────────────────────────────────────");
    let tokens = match Lexer::with_mode(&source, mode).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            println!("❌ Lex error: {}", e);
            std::process::exit(1);
        }
    };
    for token in &tokens {
        println!("{:>4}:{:<3} {:?}", token.span.line, token.span.column, token.kind);
    }
    println!();

    let program = Parser::new(&source, tokens).parse();

    println!("🌳 DECLARATIONS:");
    println!("─────────────────────────────────────────────────────────────");
    println!("{:#?}", program.declarations);
    println!();

    if !program.errors.is_empty() {
        println!("⚠️  PARSE ERRORS:");
        println!("─────────────────────────────────────────────────────────────");
        for error in &program.errors {
            println!("{}", error);
        }
        println!();
    }

    println!("🔄 CANONICAL .arc:");
    println!("─────────────────────────────────────────────────────────────");
    println!("{}", pretty_print(&program.declarations));

    if program.is_clean() {
        println!("✅ Parse succeeded!");
    } else {
        println!("❌ Parsed with {} error(s)", program.errors.len());
    }
}
