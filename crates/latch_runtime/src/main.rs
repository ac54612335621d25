//! Latch Engine Runtime
//!
//! Boots the data layer: registers component types, loads a scene, saves it
//! back when it changes and exercises client identifier allocation on the
//! worker pool.

mod components;
mod settings;

use anyhow::{Context, Result};
use components::{Ammunition, SessionState};
use latch_core::define_identifier;
use latch_core::ecs::{
    load_components, save_components, Component, ComponentRegistry, DynamicComponentStorage,
};
use latch_core::storage::{DirtyFlag, SaltedIdentifierStorage};
use rayon::prelude::*;
use serde_json::Value;
use settings::{Settings, DEFAULT_SETTINGS_PATH};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

define_identifier!(ClientKind => ClientIdentifier, u16, 8);

const DEMO_SCENE: &str = include_str!("../assets/demo_scene.json");

fn main() -> Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let settings = Settings::load(&settings_path)?;

    // RUST_LOG wins over the settings file
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Latch Engine v{}", latch_core::VERSION);
    tracing::debug!(?settings, path = %settings_path.display(), "settings loaded");

    let registry = components::build_registry().context("registering component types")?;

    let scene = read_scene(&settings)?;
    let mut storage = DynamicComponentStorage::new();
    let report = load_components(&registry, &scene, &mut storage).context("loading scene")?;

    let dirty = DirtyFlag::new();
    fire_one_round(&registry, &mut storage, &dirty);
    if dirty.take() {
        let saved = save_components(&registry, &storage, true);
        tracing::info!(document = %saved, "scene saved");
    }

    connect_clients(&settings, &registry, report.loaded.len())?;

    tracing::info!("Runtime shut down cleanly");
    Ok(())
}

fn read_scene(settings: &Settings) -> Result<Value> {
    match &settings.scene_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading scene {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing scene {}", path.display()))
        }
        None => serde_json::from_str(DEMO_SCENE).context("parsing built-in demo scene"),
    }
}

fn fire_one_round(registry: &ComponentRegistry, storage: &mut DynamicComponentStorage, dirty: &DirtyFlag) {
    let Some(ammunition_type) = registry.identifier_of::<Ammunition>() else {
        return;
    };
    let handles: Vec<_> = storage
        .live_instances(ammunition_type)
        .map(|(handle, _)| handle)
        .collect();
    for handle in handles {
        if let Some(ammunition) = storage.get_mut::<Ammunition>(handle) {
            if ammunition.rounds > 0 {
                ammunition.rounds -= 1;
                dirty.mark();
                tracing::info!(?handle, rounds = ammunition.rounds, "fired");
            }
        }
    }
}

/// Connect, drop and reconnect simulated clients from the worker pool.
/// Reconnected clients reuse slots with a bumped reuse count, so handles
/// held from the first session stop resolving.
fn connect_clients(settings: &Settings, registry: &ComponentRegistry, scene_components: usize) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.worker_threads)
        .thread_name(|index| format!("latch-worker-{index}"))
        .build()
        .context("starting worker pool")?;

    let clients = SaltedIdentifierStorage::<ClientKind>::new();
    let first_session: Vec<ClientIdentifier> = pool.install(|| {
        (0..settings.max_clients)
            .into_par_iter()
            .filter_map(|_| clients.acquire())
            .collect()
    });
    let refused = settings.max_clients - first_session.len();
    if refused > 0 {
        tracing::warn!(refused, capacity = ClientIdentifier::MAXIMUM_COUNT, "client slots exhausted");
    }

    let dropped = pool.install(|| {
        first_session
            .par_iter()
            .step_by(2)
            .filter(|client| clients.release(**client))
            .count()
    });
    let reconnected = pool.install(|| {
        (0..dropped)
            .into_par_iter()
            .filter_map(|_| clients.acquire())
            .count()
    });

    let stale = first_session
        .iter()
        .filter(|client| !clients.is_current(**client))
        .count();
    let mut sessions = DynamicComponentStorage::new();
    for _ in clients.iter() {
        sessions
            .instantiate(registry, &SessionState::TYPE_GUID)
            .context("creating session state")?;
    }

    tracing::info!(
        connected = clients.len(),
        dropped,
        reconnected,
        stale,
        sessions = sessions.len(),
        high_water = clients.maximum_used_element_count(),
        scene_components,
        "client identifiers settled"
    );
    Ok(())
}
