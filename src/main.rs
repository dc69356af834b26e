//! AZ Latency Mesh - command-line entry point
//!
//! Measures round-trip latency between every pair of availability zones in
//! each region of an inventory and writes results plus a report per run.

use az_latency_mesh::{
    app::{install_panic_hook, App},
    cli::Cli,
    error::AppError,
    executor::CancelHandle,
};
use clap::Parser;
use std::process;

/// Exit status when the user interrupted a run that still wrote its results
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() {
    install_panic_hook();

    let cli = Cli::parse();

    if cli.should_show_topic_help() {
        println!("{}", cli.display_help());
        return;
    }

    let use_color = cli.use_colors();
    let (handle, signal) = CancelHandle::new();

    let interrupt = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, finishing in-flight bookkeeping...");
            interrupt.cancel("interrupted by user");
        }
    });

    let result = match App::new(cli) {
        Ok(app) => app.run(signal).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) if handle.is_cancelled() => process::exit(INTERRUPTED_EXIT_CODE),
        Ok(_) => {}
        Err(e) => {
            eprintln!("{}", e.format_for_console(use_color));
            print_error_suggestions(&e);
            process::exit(e.exit_code());
        }
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Pass the SSH key with --ssh-key or set SSH_KEY");
            eprintln!("  - Check your .env file format");
            eprintln!("  - Run with --help-topic config for limits and defaults");
        }
        AppError::MalformedInventory(_) => {
            eprintln!();
            eprintln!("Inventory help:");
            eprintln!("  - Run 'terraform apply' before measuring, or pass --inventory <FILE>");
            eprintln!("  - Every node needs region, az_id and private_ip; probe sources need public_ip");
            eprintln!("  - Each (region, az_id) may appear only once");
        }
        AppError::Timeout(_) => {
            eprintln!();
            eprintln!("Timeout help:");
            eprintln!("  - Check that terraform can reach its state backend");
        }
        _ => {}
    }
}
