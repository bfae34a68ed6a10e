//! Command-line collaborator for the Lekha annotation engine.

/// CLI module - command-line interface for lekha
mod cli;

fn main() {
    cli::run_cli();
}
