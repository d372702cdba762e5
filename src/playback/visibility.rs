//! Decides whether the inline narration control or the mini player owns the
//! playing narration for the page currently on screen.

use crate::playback::types::{AudioState, PlaybackContext};

/// True when the page shows exactly the story and section that is playing
pub fn is_on_audio_section(state: Option<&AudioState>, page: &PlaybackContext) -> bool {
    match state {
        Some(state) => {
            state.info.story_id == page.story_id && state.info.section_name == page.section_name
        }
        None => false,
    }
}

/// True when something is playing somewhere other than the page on screen
pub fn should_show_mini_player(state: Option<&AudioState>, page: &PlaybackContext) -> bool {
    match state {
        Some(state) => {
            let story_differs = state.info.story_id != page.story_id;
            let section_differs = state.info.section_name != page.section_name;
            story_differs || section_differs
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::types::AudioInfo;

    fn playing(story_id: Option<i64>, section: &str) -> AudioState {
        AudioState::starting(AudioInfo {
            section_name: section.to_string(),
            story_id,
            story_title: "Story".to_string(),
            audio_sources: vec!["a.mp3".to_string()],
            part_durations: vec![10.0],
        })
    }

    #[test]
    fn test_nothing_playing_shows_nothing() {
        let page = PlaybackContext::new(Some(1), "Intro");
        assert!(!is_on_audio_section(None, &page));
        assert!(!should_show_mini_player(None, &page));
    }

    #[test]
    fn test_same_story_and_section_is_inline() {
        let state = playing(Some(1), "Intro");
        let page = PlaybackContext::new(Some(1), "Intro");
        assert!(is_on_audio_section(Some(&state), &page));
        assert!(!should_show_mini_player(Some(&state), &page));
    }

    #[test]
    fn test_other_section_of_same_story_shows_mini_player() {
        let state = playing(Some(1), "Intro");
        let page = PlaybackContext::new(Some(1), "Nutrition");
        assert!(!is_on_audio_section(Some(&state), &page));
        assert!(should_show_mini_player(Some(&state), &page));
    }

    #[test]
    fn test_other_story_shows_mini_player() {
        let state = playing(Some(1), "Intro");
        let page = PlaybackContext::new(Some(2), "Intro");
        assert!(should_show_mini_player(Some(&state), &page));

        let page = PlaybackContext::new(None, "Intro");
        assert!(should_show_mini_player(Some(&state), &page));
    }

    #[test]
    fn test_storyless_sections_match_on_section_name() {
        let state = playing(None, "Welcome");
        assert!(is_on_audio_section(
            Some(&state),
            &PlaybackContext::new(None, "Welcome")
        ));
        assert!(should_show_mini_player(
            Some(&state),
            &PlaybackContext::new(None, "Checklist")
        ));
    }

    #[test]
    fn test_inline_and_mini_player_are_exclusive() {
        let stories = [None, Some(1), Some(2)];
        let sections = ["Intro", "Nutrition", ""];
        for playing_story in stories {
            for playing_section in sections {
                let state = playing(playing_story, playing_section);
                for page_story in stories {
                    for page_section in sections {
                        let page = PlaybackContext::new(page_story, page_section);
                        let inline = is_on_audio_section(Some(&state), &page);
                        let mini = should_show_mini_player(Some(&state), &page);
                        assert!(!(inline && mini));
                        assert!(inline || mini);
                    }
                }
            }
        }
    }
}
