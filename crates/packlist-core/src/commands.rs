use anyhow::anyhow;
use tracing::{debug, info};

use crate::cli::Command;
use crate::item::PackListState;
use crate::persistence::Storage;
use crate::reducer::Environment;
use crate::render::Renderer;
use crate::session::Session;

#[tracing::instrument(skip(session, renderer))]
pub fn dispatch<S: Storage, E: Environment>(
    session: &mut Session<S, E>,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Templates => renderer.print_templates(session.catalog())?,
        Command::Start { template } => {
            session.start(Some(template.as_str()))?;
            info!(template = %template, "started new list");
            renderer.print_list(session.state())?;
        }
        Command::List => renderer.print_list(session.state())?,
        Command::Add { label, icon } => {
            require_started(session.state())?;
            session.add_item(&label, &icon)?;
            print_toast(session, renderer)?;
        }
        Command::Toggle { item } => {
            let id = resolve_item(session.state(), &item)?;
            session.toggle(&id);
            renderer.print_list(session.state())?;
            if let Some(message) = session.ready_message() {
                renderer.print_message(message)?;
            }
        }
        Command::Delete { item } => {
            let id = resolve_item(session.state(), &item)?;
            session.delete(&id);
            print_toast(session, renderer)?;
        }
        Command::Move { item, direction } => {
            let id = resolve_item(session.state(), &item)?;
            if !session.move_item(&id, direction.into()) {
                debug!(%id, "item already at the edge");
            }
            renderer.print_list(session.state())?;
        }
        Command::Reset { yes } => {
            if session.reset_done(yes) {
                renderer.print_list(session.state())?;
            } else {
                renderer.print_message("Nothing changed; pass --yes to uncheck every item.")?;
            }
        }
        Command::Title { text } => {
            require_started(session.state())?;
            session.rename(&text.join(" "));
            renderer.print_message(&session.state().list_title)?;
        }
        Command::Export => {
            let text = session.share_text();
            renderer.print_message(text.trim_end())?;
        }
    }

    Ok(())
}

fn require_started(state: &PackListState) -> anyhow::Result<()> {
    if state.started {
        Ok(())
    } else {
        Err(anyhow!("no list yet; run `packlist start <template>` first"))
    }
}

/// Accepts a 1-based display position or an item id.
pub fn resolve_item(state: &PackListState, reference: &str) -> anyhow::Result<String> {
    let sorted = state.sorted_items();
    if let Ok(position) = reference.parse::<usize>()
        && let Some(item) = position.checked_sub(1).and_then(|idx| sorted.get(idx))
    {
        return Ok(item.id.clone());
    }
    state
        .find(reference)
        .map(|item| item.id.clone())
        .ok_or_else(|| anyhow!("no item matches {reference}"))
}

fn print_toast<S: Storage, E: Environment>(
    session: &mut Session<S, E>,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    if let Some(toast) = session.notices().toast {
        renderer.print_message(&toast)?;
    }
    Ok(())
}
