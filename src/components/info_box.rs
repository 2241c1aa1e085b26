use crate::orchestrator::StatCard;
use dioxus::prelude::*;

#[component]
pub fn InfoBox(card: StatCard, loading: bool, onclick: EventHandler<MouseEvent>) -> Element {
    let accent = card.metric.color();

    rsx! {
        button {
            class: "info-box",
            class: if card.active { "info-box--active" },
            style: "--accent: {accent};",
            onclick: move |e| onclick.call(e),
            div { class: "info-box__title", "{card.title}" }
            if loading {
                div { class: "info-box__loading", "Loading..." }
            } else {
                div { class: "info-box__today", "{card.today}" }
                div { class: "info-box__total", "{card.total} Total" }
            }
        }
    }
}
