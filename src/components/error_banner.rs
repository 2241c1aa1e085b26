use crate::hooks::use_dashboard;
use crate::orchestrator::ErrorBanner as Banner;
use dioxus::prelude::*;

#[component]
pub fn ErrorBanner(banner: Banner) -> Element {
    let dashboard = use_dashboard();

    rsx! {
        div { class: "error-banner",
            span { class: "error-banner__message", "{banner.message}" }
            if banner.retryable {
                button {
                    class: "error-banner__retry",
                    onclick: move |_| dashboard.retry(),
                    "Retry"
                }
            }
        }
    }
}
