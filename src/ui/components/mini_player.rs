use crate::playback::visibility::should_show_mini_player;
use crate::playback::{AudioState, PlaybackPhase};
use crate::ui::time_format::{format_clock, progress_percent};
use crate::ui::Route;
use dioxus::prelude::*;
use tracing::warn;

use super::{use_audio_state, use_playback_service};

#[component]
fn MiniPlayerControls(
    phase: PlaybackPhase,
    on_toggle: EventHandler<()>,
    on_close: EventHandler<()>,
) -> Element {
    rsx! {
        div { class: "flex items-center gap-2",
            match phase {
                PlaybackPhase::Loading => rsx! {
                    button {
                        class: "px-4 py-2 bg-blue-600 rounded opacity-50 flex items-center justify-center",
                        disabled: true,
                        div { class: "animate-spin rounded-full h-4 w-4 border-b-2 border-white" }
                    }
                },
                PlaybackPhase::Playing => rsx! {
                    button {
                        class: "px-4 py-2 bg-blue-600 rounded hover:bg-blue-500",
                        onclick: move |_| on_toggle.call(()),
                        "⏸"
                    }
                },
                PlaybackPhase::Ended => rsx! {
                    button {
                        class: "px-4 py-2 bg-green-600 rounded hover:bg-green-500",
                        onclick: move |_| on_toggle.call(()),
                        "↺"
                    }
                },
                PlaybackPhase::Paused => rsx! {
                    button {
                        class: "px-4 py-2 bg-green-600 rounded hover:bg-green-500",
                        onclick: move |_| on_toggle.call(()),
                        "▶"
                    }
                },
                PlaybackPhase::Error => rsx! {
                    button {
                        class: "px-4 py-2 bg-red-700 rounded hover:bg-red-600",
                        title: "Retry this part",
                        onclick: move |_| on_toggle.call(()),
                        "Retry"
                    }
                },
            }
            button {
                class: "px-3 py-2 bg-gray-700 rounded hover:bg-gray-600",
                title: "Stop",
                onclick: move |_| on_close.call(()),
                "✕"
            }
        }
    }
}

#[component]
fn NarrationInfoZone(state: AudioState) -> Element {
    let route = Route::for_context(&state.context());

    rsx! {
        div { class: "flex-1 min-w-0",
            div {
                class: "font-semibold truncate cursor-pointer hover:text-blue-300 transition-colors",
                onclick: move |_| {
                    navigator().push(route.clone());
                },
                "{state.info.story_title}"
            }
            div { class: "text-sm text-gray-400 truncate",
                "{state.info.section_name}"
                if let Some(error) = &state.error {
                    span { class: "text-red-400 ml-2", "{error}" }
                }
            }
        }
    }
}

/// Bottom bar for a narration that plays while the user reads elsewhere
#[component]
pub fn MiniPlayer() -> Element {
    let playback = use_playback_service();
    let audio = use_audio_state();

    let visible = should_show_mini_player(audio.state.read().as_ref(), &audio.page.read());
    let current = audio.state.read().clone();
    let Some(current) = current.filter(|_| visible) else {
        return rsx! {};
    };

    let on_toggle = {
        let playback = playback.clone();
        move |_: ()| {
            let playback = playback.clone();
            spawn(async move {
                if let Err(e) = playback.toggle_play_pause().await {
                    warn!("Play/pause failed: {}", e);
                }
            });
        }
    };
    let on_close = move |_: ()| playback.stop_audio();
    let percent = progress_percent(current.current_time, current.duration);

    rsx! {
        div { class: "fixed bottom-0 left-0 right-0 bg-gray-800 text-white border-t border-gray-700",
            div { class: "h-1 bg-gray-700",
                div {
                    class: "h-full bg-blue-600",
                    style: "width: {percent}%;",
                }
            }
            div { class: "flex items-center gap-4 px-4 py-3",
                NarrationInfoZone { state: current.clone() }
                span { class: "text-sm text-gray-400",
                    "{format_clock(current.current_time)} / {format_clock(current.duration)}"
                }
                MiniPlayerControls {
                    phase: current.phase(),
                    on_toggle,
                    on_close,
                }
            }
        }
    }
}
