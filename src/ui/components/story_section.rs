use crate::catalog::NarrationSection;
use crate::playback::PlaybackContext;
use crate::ui::Route;
use crate::AppContext;
use dioxus::prelude::*;

use super::NarrationControl;

/// Section page of a story
#[component]
pub fn StorySection(story_id: ReadSignal<i64>, section: ReadSignal<String>) -> Element {
    rsx! {
        SectionPage { page: PlaybackContext::new(Some(story_id()), section()) }
    }
}

/// Section page of the reading guide, which belongs to no story
#[component]
pub fn GuideSection(section: ReadSignal<String>) -> Element {
    rsx! {
        SectionPage { page: PlaybackContext::new(None, section()) }
    }
}

#[component]
fn SectionPage(page: PlaybackContext) -> Element {
    let app = use_context::<AppContext>();

    // Keep the playback page context in step with the route
    use_effect(use_reactive(&page, {
        let playback = app.playback_handle.clone();
        move |page: PlaybackContext| {
            playback.set_current_page_story_id(page.story_id);
            playback.set_current_section(page.section_name);
        }
    }));

    let sections: Vec<NarrationSection> = app
        .catalog
        .sections_for_story(page.story_id)
        .into_iter()
        .cloned()
        .collect();
    let story_title = sections
        .first()
        .map(|s| s.story_title.clone())
        .unwrap_or_default();
    let audio_info = app.catalog.audio_info(page.story_id, &page.section_name);

    rsx! {
        PageContainer {
            h1 { class: "text-3xl font-bold mb-4", "{story_title}" }
            div { class: "flex gap-2 mb-6 border-b border-gray-700",
                for s in sections {
                    SectionTab {
                        key: "{s.section_name}",
                        active: s.section_name == page.section_name,
                        route: Route::for_context(&PlaybackContext::new(s.story_id, s.section_name.clone())),
                        label: s.section_name.clone(),
                    }
                }
            }
            h2 { class: "text-xl font-semibold mb-3", "{page.section_name}" }
            if let Some(info) = audio_info {
                NarrationControl { info }
            } else {
                p { class: "text-gray-500", "No narration for this section" }
            }
        }
    }
}

#[component]
fn SectionTab(active: bool, route: Route, label: String) -> Element {
    rsx! {
        Link {
            to: route,
            class: if active {
                "px-3 py-2 border-b-2 border-blue-500 text-white"
            } else {
                "px-3 py-2 text-gray-400 hover:text-white"
            },
            "{label}"
        }
    }
}

#[component]
fn PageContainer(children: Element) -> Element {
    rsx! {
        div { class: "container mx-auto p-6 pb-28", {children} }
    }
}
