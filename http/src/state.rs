use std::sync::Arc;

use tarragona_core::Core;

/// Shared app state behind every handler (teacher's `AppState` in
/// st-server/src/app.rs, minus the leptos-specific pieces).
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<Core>,
}
