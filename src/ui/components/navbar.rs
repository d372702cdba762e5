use crate::ui::Route;
use dioxus::prelude::*;

use super::MiniPlayer;

/// Layout component with the header, page content and mini player
#[component]
pub fn Navbar() -> Element {
    rsx! {
        div { class: "bg-gray-800 text-white px-6 py-3 flex items-center gap-6",
            Link {
                to: Route::Home {},
                class: "font-bold hover:text-blue-300 transition-colors",
                "Bloom"
            }
        }
        Outlet::<Route> {}
        MiniPlayer {}
    }
}
