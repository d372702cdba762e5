use crate::playback::{AudioInfo, PlaybackPhase};
use crate::ui::time_format::{format_clock, progress_percent};
use dioxus::prelude::*;
use tracing::warn;

use super::{use_audio_state, use_playback_service};

/// Inline narration control for one section of a story.
///
/// Shows a "Listen" button until this section is the one playing, then
/// takes over the transport controls for it.
#[component]
pub fn NarrationControl(info: AudioInfo) -> Element {
    let playback = use_playback_service();
    let audio = use_audio_state();
    let mut action_error = use_signal(|| None::<String>);

    let section_context = info.context();
    let current = audio
        .state
        .read()
        .as_ref()
        .filter(|state| state.context() == section_context)
        .cloned();

    let on_listen = {
        let playback = playback.clone();
        let info = info.clone();
        move |_: MouseEvent| {
            let playback = playback.clone();
            let info = info.clone();
            action_error.set(None);
            spawn(async move {
                if let Err(e) = playback.start_audio(info).await {
                    warn!("Failed to start narration: {}", e);
                    action_error.set(Some(e.to_string()));
                }
            });
        }
    };

    let Some(current) = current else {
        return rsx! {
            div { class: "flex items-center gap-3",
                button {
                    class: "px-4 py-2 bg-green-600 rounded hover:bg-green-500",
                    onclick: on_listen,
                    "▶ Listen"
                }
                if let Some(error) = action_error() {
                    span { class: "text-sm text-red-400", "{error}" }
                }
            }
        };
    };

    let on_toggle = {
        let playback = playback.clone();
        move |_: MouseEvent| {
            let playback = playback.clone();
            action_error.set(None);
            spawn(async move {
                if let Err(e) = playback.toggle_play_pause().await {
                    warn!("Play/pause failed: {}", e);
                    action_error.set(Some(e.to_string()));
                }
            });
        }
    };

    let on_seek = {
        let playback = playback.clone();
        move |virtual_time: f64| playback.seek_to(virtual_time)
    };

    let phase = current.phase();
    let error = current.error.clone().or(action_error());

    rsx! {
        div { class: "flex flex-col gap-2",
            div { class: "flex items-center gap-3",
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
                            onclick: on_toggle,
                            "⏸"
                        }
                    },
                    PlaybackPhase::Paused => rsx! {
                        button {
                            class: "px-4 py-2 bg-green-600 rounded hover:bg-green-500",
                            onclick: on_toggle,
                            "▶"
                        }
                    },
                    PlaybackPhase::Ended => rsx! {
                        button {
                            class: "px-4 py-2 bg-green-600 rounded hover:bg-green-500",
                            onclick: on_toggle,
                            "↺ Replay"
                        }
                    },
                    PlaybackPhase::Error => rsx! {
                        button {
                            class: "px-4 py-2 bg-gray-700 rounded hover:bg-gray-600",
                            title: "Retry this part",
                            onclick: on_toggle,
                            "Retry"
                        }
                    },
                }
                span { class: "text-sm text-gray-400",
                    "{format_clock(current.current_time)} / {format_clock(current.duration)}"
                }
                if current.info.part_count() > 1 {
                    span { class: "text-xs text-gray-500",
                        "Part {current.current_part_index + 1} of {current.info.part_count()}"
                    }
                }
            }
            SeekSlider {
                current_time: current.current_time,
                duration: current.duration,
                on_seek,
            }
            if let Some(error) = error {
                div { class: "text-sm text-red-400", "{error}" }
            }
        }
    }
}

/// Slider over the whole narration, in virtual seconds
#[component]
fn SeekSlider(current_time: f64, duration: f64, on_seek: EventHandler<f64>) -> Element {
    // Position being dragged to; published time is ignored until release
    let mut dragging = use_signal(|| None::<f64>);
    let shown = dragging().unwrap_or(current_time);
    let percent = progress_percent(shown, duration);

    rsx! {
        input {
            r#type: "range",
            class: "w-full h-2 bg-gray-700 rounded-lg appearance-none cursor-pointer",
            style: "background: linear-gradient(to right, #3b82f6 0%, #3b82f6 {percent}%, #374151 {percent}%, #374151 100%);",
            min: "0",
            max: "{duration}",
            step: "0.1",
            value: "{shown}",
            oninput: move |evt| {
                if let Ok(secs) = evt.value().parse::<f64>() {
                    dragging.set(Some(secs));
                }
            },
            onchange: move |evt| {
                if let Ok(secs) = evt.value().parse::<f64>() {
                    on_seek.call(secs);
                }
                dragging.set(None);
            },
        }
    }
}
