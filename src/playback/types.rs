use crate::playback::error::PlaybackError;
use crate::playback::timeline;
use serde::{Deserialize, Serialize};

/// A narration as handed to the coordinator by the caller.
///
/// Immutable once playback starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub section_name: String,
    pub story_id: Option<i64>,
    pub story_title: String,
    /// Part URLs, in playback order
    pub audio_sources: Vec<String>,
    /// Part durations in seconds, parallel to `audio_sources`
    pub part_durations: Vec<f64>,
}

impl AudioInfo {
    /// Check the part list before any playback is touched
    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.audio_sources.is_empty() {
            return Err(PlaybackError::InvalidAudioInfo(
                "narration has no audio parts".to_string(),
            ));
        }

        if self.audio_sources.len() != self.part_durations.len() {
            return Err(PlaybackError::InvalidAudioInfo(format!(
                "{} audio sources but {} part durations",
                self.audio_sources.len(),
                self.part_durations.len()
            )));
        }

        if let Some((index, duration)) = self
            .part_durations
            .iter()
            .enumerate()
            .find(|(_, d)| !d.is_finite() || **d < 0.0)
        {
            return Err(PlaybackError::InvalidAudioInfo(format!(
                "part {} has invalid duration {}",
                index, duration
            )));
        }

        Ok(())
    }

    pub fn part_count(&self) -> usize {
        self.audio_sources.len()
    }

    /// Where this narration lives in the app
    pub fn context(&self) -> PlaybackContext {
        PlaybackContext {
            story_id: self.story_id,
            section_name: self.section_name.clone(),
        }
    }
}

/// The single published playback snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioState {
    #[serde(flatten)]
    pub info: AudioInfo,
    pub is_playing: bool,
    pub is_loading: bool,
    /// Virtual time in seconds, `0 <= current_time <= duration`
    pub current_time: f64,
    /// Sum of all part durations
    pub duration: f64,
    pub current_part_index: usize,
    /// Set when a part failed to load; cleared by the next load
    pub error: Option<String>,
}

/// Coarse phase derived from an [`AudioState`], used to pick view affordances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    Loading,
    Playing,
    Paused,
    Ended,
    Error,
}

impl AudioState {
    /// Fresh state for a narration that is about to load its first part
    pub fn starting(info: AudioInfo) -> Self {
        let duration = timeline::total_duration(&info.part_durations);
        Self {
            info,
            is_playing: false,
            is_loading: true,
            current_time: 0.0,
            duration,
            current_part_index: 0,
            error: None,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_last_part(&self) -> bool {
        self.current_part_index + 1 >= self.info.part_count()
    }

    pub fn phase(&self) -> PlaybackPhase {
        if self.is_loading {
            PlaybackPhase::Loading
        } else if self.error.is_some() {
            PlaybackPhase::Error
        } else if self.is_playing {
            PlaybackPhase::Playing
        } else if self.duration > 0.0
            && self.is_last_part()
            && self.current_time >= self.duration
        {
            PlaybackPhase::Ended
        } else {
            PlaybackPhase::Paused
        }
    }

    pub fn context(&self) -> PlaybackContext {
        self.info.context()
    }
}

/// `(story, section)` pair identifying what is playing or what is on screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackContext {
    pub story_id: Option<i64>,
    pub section_name: String,
}

impl PlaybackContext {
    pub fn new(story_id: Option<i64>, section_name: impl Into<String>) -> Self {
        Self {
            story_id,
            section_name: section_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(sources: usize, durations: Vec<f64>) -> AudioInfo {
        AudioInfo {
            section_name: "Week 12".to_string(),
            story_id: Some(3),
            story_title: "First Trimester".to_string(),
            audio_sources: (0..sources)
                .map(|i| format!("https://cdn.example/w12/part{}.mp3", i))
                .collect(),
            part_durations: durations,
        }
    }

    #[test]
    fn test_validate_accepts_matching_parts() {
        assert!(info(3, vec![100.0, 50.0, 30.0]).validate().is_ok());
        assert!(info(1, vec![0.0]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_part_lists() {
        assert!(matches!(
            info(0, vec![]).validate(),
            Err(PlaybackError::InvalidAudioInfo(_))
        ));
        assert!(matches!(
            info(2, vec![10.0]).validate(),
            Err(PlaybackError::InvalidAudioInfo(_))
        ));
        assert!(matches!(
            info(2, vec![10.0, -1.0]).validate(),
            Err(PlaybackError::InvalidAudioInfo(_))
        ));
        assert!(matches!(
            info(1, vec![f64::NAN]).validate(),
            Err(PlaybackError::InvalidAudioInfo(_))
        ));
    }

    #[test]
    fn test_starting_state() {
        let state = AudioState::starting(info(3, vec![100.0, 50.0, 30.0]));
        assert_eq!(state.duration, 180.0);
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.current_part_index, 0);
        assert!(state.is_loading);
        assert!(!state.is_playing);
        assert_eq!(state.phase(), PlaybackPhase::Loading);
    }

    #[test]
    fn test_phase_ended_only_at_end_of_last_part() {
        let mut state = AudioState::starting(info(2, vec![10.0, 5.0]));
        state.is_loading = false;
        state.current_part_index = 1;
        state.current_time = 15.0;
        assert_eq!(state.phase(), PlaybackPhase::Ended);

        state.current_time = 12.0;
        assert_eq!(state.phase(), PlaybackPhase::Paused);

        state.is_playing = true;
        assert_eq!(state.phase(), PlaybackPhase::Playing);

        state.is_playing = false;
        state.error = Some("boom".to_string());
        assert_eq!(state.phase(), PlaybackPhase::Error);
    }

    #[test]
    fn test_zero_length_narration_is_not_ended_before_playing() {
        let mut state = AudioState::starting(info(1, vec![0.0]));
        state.is_loading = false;
        assert_eq!(state.duration, 0.0);
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.phase(), PlaybackPhase::Paused);
    }
}
