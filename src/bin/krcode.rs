//! Command-line interface for the KR decoder
//! This binary decodes KR morphological codes into attribute dictionaries
//! and validates the KR column of corpus files.
//!
//! Usage:
//!   krcode token `<code>` [--format `<format>`]  - Decode a single KR code
//!   krcode stream                              - Decode stdin tokens, one line of space-separated tokens at a time
//!   krcode corpus `<path>` [--column `<n>`]        - Validate the KR column of a corpus file

use clap::{Arg, Command};
use std::io::{self, BufRead};
use std::path::Path;

use krcode::kr::attributes::decode;
use krcode::kr::parser::parse_compound;
use krcode::kr::reader::{CorpusReader, KrFieldCallback};

fn main() {
    let matches = Command::new("krcode")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for decoding KR morphological codes")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("token")
                .about("Decode a single KR code and print its attributes")
                .arg(
                    Arg::new("code")
                        .help("The KR code to decode")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format ('json' or 'render')")
                        .default_value("json"),
                ),
        )
        .subcommand(
            Command::new("stream")
                .about("Validate space-separated tokens read line by line from stdin"),
        )
        .subcommand(
            Command::new("corpus")
                .about("Validate the KR column of a corpus file")
                .arg(
                    Arg::new("path")
                        .help("Path to the corpus file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("column")
                        .long("column")
                        .short('c')
                        .help("Zero-based index of the KR column in word lines")
                        .default_value("1"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("token", token_matches)) => {
            let code = token_matches.get_one::<String>("code").unwrap();
            let format = token_matches.get_one::<String>("format").unwrap();
            handle_token_command(code, format);
        }
        Some(("stream", _)) => {
            handle_stream_command();
        }
        Some(("corpus", corpus_matches)) => {
            let path = corpus_matches.get_one::<String>("path").unwrap();
            let column = corpus_matches.get_one::<String>("column").unwrap();
            handle_corpus_command(path, column);
        }
        _ => unreachable!(),
    }
}

/// Handle the token command. Any failure propagates as a non-zero exit.
fn handle_token_command(code: &str, format: &str) {
    match format {
        "render" => {
            let compound = parse_compound(code).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
            println!("{}", compound);
        }
        "json" => {
            let attributes = decode(code).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
            let output = serde_json::to_string_pretty(&attributes).unwrap_or_else(|e| {
                eprintln!("Serialization error: {}", e);
                std::process::exit(1);
            });
            println!("{}", output);
        }
        other => {
            eprintln!("Unknown format: {}", other);
            std::process::exit(1);
        }
    }
}

/// Handle the stream command. Failures are logged per token and processing
/// continues with the next one.
fn handle_stream_command() {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.unwrap_or_else(|e| {
            eprintln!("Error reading input: {}", e);
            std::process::exit(1);
        });
        for token in line.split_whitespace() {
            if let Err(e) = parse_compound(token) {
                eprintln!("BAD KR CODE '{}': {}", token, e);
            }
        }
    }
}

/// Handle the corpus command
fn handle_corpus_command(path: &str, column: &str) {
    let column: usize = column.parse().unwrap_or_else(|_| {
        eprintln!("Error: --column must be a non-negative number");
        std::process::exit(1);
    });

    let mut callback = KrFieldCallback::new(column);
    {
        let mut reader = CorpusReader::new();
        reader.add_callback(&mut callback);
        if let Err(e) = reader.read_file(Path::new(path)) {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    }
    println!(
        "{} codes decoded, {} failed",
        callback.decoded, callback.failed
    );
}
