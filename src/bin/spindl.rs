//! spindl - terminal client for a self-hosted Spotify download server.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::env;

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

fn print_usage() {
    eprintln!("Usage: spindl [OPTIONS] [link]...");
    eprintln!();
    eprintln!("Without links, opens the interactive TUI.");
    eprintln!("With links, submits each one and prints the server's verdict.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --server <URL>   Server base URL (default: {DEFAULT_SERVER},");
    eprintln!("                   overridable via SPINDL_SERVER)");
    eprintln!("  -h, --help       Show this help");
}

#[tokio::main]
async fn main() -> spindl::Result<()> {
    env_logger::init();

    let mut server = env::var("SPINDL_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_string());
    let mut links = Vec::new();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--server" => {
                i += 1;
                if i < args.len() {
                    server = args[i].clone();
                } else {
                    eprintln!("Error: --server requires a value");
                    std::process::exit(1);
                }
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: unknown option {arg}");
                print_usage();
                std::process::exit(1);
            }
            link => links.push(link.to_string()),
        }
        i += 1;
    }

    if links.is_empty() {
        #[cfg(feature = "tui")]
        {
            spindl::tui::run(&server).await
        }
        #[cfg(not(feature = "tui"))]
        {
            eprintln!("TUI support not compiled in; pass links for one-shot mode");
            std::process::exit(1);
        }
    } else {
        spindl::cli::run(&server, links).await
    }
}
