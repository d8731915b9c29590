pub mod cli;
pub mod commands;
pub mod config;
pub mod gesture;
pub mod item;
pub mod persistence;
pub mod reducer;
pub mod render;
pub mod schema;
pub mod session;
pub mod share;
pub mod template;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let pre = cli::preprocess_args(&raw_args)?;
    let cli = cli::GlobalCli::parse_from(pre.cleaned_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting packlist");
    debug!(?pre.rc_overrides, "preprocessed rc overrides");

    let mut cfg = config::Config::load(cli.packlistrc.as_deref())?;
    cfg.apply_overrides(
        pre.rc_overrides
            .into_iter()
            .chain(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value))),
    );

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let storage = persistence::FileStorage::open(&data_dir)
        .with_context(|| format!("failed to open storage at {}", data_dir.display()))?;

    let mut session = session::Session::open(
        persistence::PersistenceGateway::new(storage),
        reducer::SystemEnvironment,
        template::TemplateCatalog::builtin(),
        cfg.gesture_config()?,
    );

    let mut renderer = render::Renderer::new(&cfg)?;
    let command = cli.command.unwrap_or(cli::Command::List);

    commands::dispatch(&mut session, &mut renderer, command)?;
    session.teardown();

    info!("done");
    Ok(())
}
