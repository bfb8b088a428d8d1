use std::sync::Arc;

use clap::Parser;

mod cli;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod routing;
mod server;
mod site;

use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config::Config::load_from(&cli.config.to_string_lossy(), &cli.overrides())?;

    match cli.command {
        Commands::Serve { .. } => serve(cfg),
        Commands::Check { json } => check(&cfg, json),
        Commands::Rewrite { job, dry_run } => rewrite(&cfg, job.as_deref(), dry_run),
    }
}

fn serve(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    // Build the runtime, sizing the worker pool from `server.workers`
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(config::AppState::new(cfg)?);

    logger::log_server_start(&listener.local_addr()?, &state);

    server::run(listener, state).await;
    Ok(())
}

fn check(cfg: &config::Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = site::Manifest::load(&cfg.site.manifest_path())?;
    let report = site::run_check(&cfg.site.root, &manifest)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", site::format_report(&report));
    }
    Ok(())
}

fn rewrite(
    cfg: &config::Config,
    job: Option<&str>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = site::Manifest::load(&cfg.site.manifest_path())?;

    match job {
        Some(job) => {
            site::run_rewrite(&cfg.site.root, &manifest, job, dry_run)?;
        }
        None => site::list_jobs(&manifest),
    }
    Ok(())
}
