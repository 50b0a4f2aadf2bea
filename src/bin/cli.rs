//! CairnKV CLI Client
//!
//! Sends one command line to a CairnKV server and prints the reply.
//! With SUBSCRIBE it keeps the connection open and prints pushed messages.

use std::io::{BufRead, BufReader, BufWriter};
use std::net::TcpStream;
use std::process::ExitCode;

use cairnkv::protocol::write_line;
use cairnkv::pubsub::PUSH_PREFIX;
use clap::Parser;

/// CairnKV CLI
#[derive(Parser, Debug)]
#[command(name = "cairnkv-cli")]
#[command(about = "CLI for the CairnKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Command and arguments, e.g. `SET greeting hello world`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> cairnkv::Result<()> {
    let stream = TcpStream::connect(&args.server)?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    write_line(&mut writer, &args.command.join(" "))?;

    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(cairnkv::CairnError::Network(
            "server closed the connection".to_string(),
        ));
    }
    println!("{}", line.trim_end_matches(['\r', '\n']));

    if args.command.first().map(String::as_str) != Some("SUBSCRIBE") {
        return Ok(());
    }

    // Stay attached and print pushed messages without their marker
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let text = line.trim_end_matches(['\r', '\n']);
        println!("{}", text.strip_prefix(PUSH_PREFIX).unwrap_or(text));
    }
}
