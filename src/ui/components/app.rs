use crate::ui::{Route, MAIN_CSS};
use dioxus::prelude::*;
use tracing::debug;

use super::playback_hooks::AudioStateProvider;

#[component]
pub fn App() -> Element {
    debug!("Rendering app component");

    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        AudioStateProvider {
            div { class: "min-h-screen bg-gray-900 text-white", Router::<Route> {} }
        }
    }
}
