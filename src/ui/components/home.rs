use crate::playback::PlaybackContext;
use crate::ui::Route;
use crate::AppContext;
use dioxus::prelude::*;

/// Story list
#[component]
pub fn Home() -> Element {
    let app = use_context::<AppContext>();

    // No section is on screen here
    use_effect({
        let playback = app.playback_handle.clone();
        move || {
            playback.set_current_page_story_id(None);
            playback.set_current_section("");
        }
    });

    let stories: Vec<(String, Option<Route>, usize)> = app
        .catalog
        .stories()
        .into_iter()
        .map(|(story_id, title)| {
            let sections = app.catalog.sections_for_story(story_id);
            let narrated = sections.iter().filter(|s| s.has_audio()).count();
            let route = sections.first().map(|first| {
                Route::for_context(&PlaybackContext::new(story_id, first.section_name.clone()))
            });
            (title, route, narrated)
        })
        .collect();

    rsx! {
        div { class: "container mx-auto p-6 pb-28",
            h1 { class: "text-3xl font-bold mb-6", "Stories" }
            if stories.is_empty() {
                p { class: "text-gray-500",
                    "No stories found. Check {app.config.catalog_path.display()}"
                }
            }
            ul { class: "space-y-2",
                for (title, route, narrated) in stories {
                    li { key: "{title}",
                        if let Some(route) = route {
                            Link {
                                to: route,
                                class: "text-lg hover:text-blue-300 transition-colors",
                                "{title}"
                            }
                        } else {
                            span { class: "text-lg", "{title}" }
                        }
                        span { class: "ml-3 text-sm text-gray-500", "{narrated} narrated" }
                    }
                }
            }
        }
    }
}
