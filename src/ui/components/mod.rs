pub mod app;
pub mod home;
pub mod mini_player;
pub mod narration_control;
pub mod navbar;
pub mod playback_hooks;
pub mod story_section;

pub use app::App;
pub use home::Home;
pub use mini_player::MiniPlayer;
pub use narration_control::NarrationControl;
pub use navbar::Navbar;
pub use playback_hooks::*;
pub use story_section::{GuideSection, StorySection};
