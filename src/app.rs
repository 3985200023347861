use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::action::Reducer;
use crate::config::{self, Config};
use crate::dispatch::Session;
use crate::feed::UuidGenerator;
use crate::logging;
use crate::snapshot::{self, Origin};
use crate::storage;
use crate::ui;

pub fn run() -> Result<()> {
    match logging::init() {
        Ok(path) => info!(log = %path.display(), "starting chirp {}", crate::VERSION),
        Err(err) => eprintln!("logging disabled: {err:?}"),
    }

    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let store = open_store(&cfg)?;
    let (session, origin) = load_session(&store, &cfg)?;

    let status_message = match origin {
        Origin::Stored => "Welcome back. Press n to post, q to quit.".to_string(),
        Origin::Seeded => "Fresh feed loaded. Press n to post, q to quit.".to_string(),
        Origin::Reseeded => {
            "Stored feed was unreadable and has been replaced with the starter feed.".to_string()
        }
    };

    let mut model = ui::Model::new(ui::Options {
        session,
        tick_rate: cfg.ui.tick_rate,
        status_message,
    });
    let result = model.run();

    let feed = model.into_session().into_feed();
    snapshot::save(&store, &cfg.storage.key, &feed).context("save feed")?;
    if let Err(err) = store.close() {
        warn!(error = %err, "storage did not close cleanly");
    }

    result
}

/// Writes the rendered page for the stored feed to `path`.
pub fn export_html(path: &Path) -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let store = open_store(&cfg)?;
    let (session, _) = load_session(&store, &cfg)?;
    fs::write(path, session.page().document_html())
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Drops the stored feed so the next start uses the seed. Returns whether
/// anything was stored.
pub fn reset() -> Result<bool> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let store = open_store(&cfg)?;
    snapshot::clear(&store, &cfg.storage.key).context("clear stored feed")
}

fn open_store(cfg: &Config) -> Result<storage::Store> {
    storage::Store::open(storage::Options {
        path: cfg.storage.path.clone(),
        in_memory: false,
    })
    .context("open storage")
}

pub fn load_session(store: &storage::Store, cfg: &Config) -> Result<(Session, Origin)> {
    let (feed, origin) = snapshot::load(store, &cfg.storage.key).context("load feed")?;
    let reducer = Reducer::new(cfg.author.to_author(), Box::new(UuidGenerator));
    Ok((Session::new(feed, reducer), origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Target;

    #[test]
    fn session_changes_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.storage.path = Some(dir.path().join("state.db"));
        cfg.author.handle = "@tester".into();

        let store = open_store(&cfg).unwrap();
        let (mut session, origin) = load_session(&store, &cfg).unwrap();
        assert_eq!(origin, Origin::Seeded);
        session.page_mut().set_composer("persist me");
        session.click(&Target::submit());
        snapshot::save(&store, &cfg.storage.key, session.feed()).unwrap();
        store.close().unwrap();

        let store = open_store(&cfg).unwrap();
        let (session, origin) = load_session(&store, &cfg).unwrap();
        assert_eq!(origin, Origin::Stored);
        assert_eq!(session.feed().len(), 4);
        assert_eq!(session.feed().posts()[0].handle, "@tester");
        assert_eq!(session.feed().posts()[0].text, "persist me");
    }
}
