/// Tessera CLI
///
/// Parses, checks and evaluates configuration files from the command line.
use tessera_core::cli;

fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
