pub mod handle;

pub use handle::PlaybackProgressHandle;

/// Discrete playback transitions, in the order the coordinator makes them.
///
/// Position changes are not sent here; read them from the state watch.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackProgress {
    NarrationStarted {
        story_id: Option<i64>,
        section_name: String,
        part_count: usize,
    },
    PartReady {
        part_index: usize,
        is_playing: bool,
    },
    PartAdvanced {
        from_part: usize,
        to_part: usize,
    },
    PlaybackRejected {
        part_index: usize,
        message: String,
    },
    LoadFailed {
        part_index: usize,
        message: String,
    },
    Seeked {
        virtual_time: f64,
        part_index: usize,
    },
    NarrationCompleted {
        story_id: Option<i64>,
        section_name: String,
    },
    Stopped,
}
