#[cfg(feature = "desktop")]
use dioxus::desktop::{Config as DioxusConfig, WindowBuilder};
use dioxus::prelude::*;

use crate::playback::PlaybackContext;
use crate::ui::components::*;

pub const MAIN_CSS: Asset = asset!("/assets/main.css");

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Navbar)]
    #[route("/")]
    Home {},
    #[route("/story/:story_id/:section")]
    StorySection { story_id: i64, section: String },
    #[route("/guide/:section")]
    GuideSection { section: String },
}

impl Route {
    /// Page that shows the section a narration belongs to
    pub fn for_context(context: &PlaybackContext) -> Self {
        match context.story_id {
            Some(story_id) => Route::StorySection {
                story_id,
                section: context.section_name.clone(),
            },
            None => Route::GuideSection {
                section: context.section_name.clone(),
            },
        }
    }
}

#[cfg(feature = "desktop")]
pub fn make_config() -> DioxusConfig {
    DioxusConfig::default().with_window(make_window())
}

#[cfg(feature = "desktop")]
fn make_window() -> WindowBuilder {
    WindowBuilder::new()
        .with_title("Bloom")
        .with_always_on_top(false)
        .with_inner_size(dioxus::desktop::LogicalSize::new(1000, 760))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_for_story_section() {
        let context = PlaybackContext::new(Some(7), "Intro");
        assert_eq!(
            Route::for_context(&context),
            Route::StorySection {
                story_id: 7,
                section: "Intro".to_string()
            }
        );
    }

    #[test]
    fn test_route_for_guide_section() {
        let context = PlaybackContext::new(None, "Welcome");
        assert_eq!(
            Route::for_context(&context),
            Route::GuideSection {
                section: "Welcome".to_string()
            }
        );
    }
}
