use crate::playback::{AudioState, PlaybackContext, PlaybackHandle};
use crate::AppContext;
use dioxus::prelude::*;

/// Hook to access the playback service
pub fn use_playback_service() -> PlaybackHandle {
    let context = use_context::<AppContext>();
    context.playback_handle.clone()
}

/// Published narration state and page context, mirrored into signals so
/// components can read them synchronously on first render
#[derive(Clone, Copy)]
pub struct SharedAudioState {
    pub state: Signal<Option<AudioState>>,
    pub page: Signal<PlaybackContext>,
}

/// Provider component to make narration state available throughout the app
#[component]
pub fn AudioStateProvider(children: Element) -> Element {
    let playback = use_playback_service();
    let shared_state = SharedAudioState {
        state: use_signal(|| playback.audio_state()),
        page: use_signal(|| playback.page_context()),
    };

    use_context_provider(|| shared_state);

    use_effect({
        let playback = playback.clone();
        let mut state_signal = shared_state.state;
        let mut page_signal = shared_state.page;
        move || {
            let mut state_rx = playback.subscribe_state();
            spawn(async move {
                state_signal.set(state_rx.borrow_and_update().clone());
                while state_rx.changed().await.is_ok() {
                    let state = state_rx.borrow_and_update().clone();
                    state_signal.set(state);
                }
            });

            let mut page_rx = playback.subscribe_page_context();
            spawn(async move {
                page_signal.set(page_rx.borrow_and_update().clone());
                while page_rx.changed().await.is_ok() {
                    let page = page_rx.borrow_and_update().clone();
                    page_signal.set(page);
                }
            });
        }
    });

    rsx! {
        {children}
    }
}

/// Hook to access the shared narration signals
pub fn use_audio_state() -> SharedAudioState {
    use_context::<SharedAudioState>()
}
