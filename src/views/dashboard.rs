use crate::components::{ErrorBanner, InfoBox, LineGraph, RegionSelect, RegionTable, StatsMap};
use crate::hooks::{use_dashboard, use_dashboard_view};
use dioxus::prelude::*;

#[component]
pub fn Dashboard() -> Element {
    let dashboard = use_dashboard();
    let view = use_dashboard_view();

    if !dashboard.available() {
        return rsx! {
            div { class: "app app--fatal",
                "The statistics client could not be started. Check the logs for details."
            }
        };
    }

    let selected = view.selection.code().unwrap_or_default().to_string();
    let selection_value = view.selection.value().to_string();
    let metric = view.metric;

    rsx! {
        div { class: "app",
            div { class: "app__left",
                div { class: "app__header",
                    h1 { "COVID-19 Tracker" }
                    RegionSelect { options: view.options.clone(), value: selection_value }
                }

                if let Some(banner) = view.error.clone() {
                    ErrorBanner { banner }
                }

                div { class: "app__stats",
                    for card in view.cards.clone() {
                        {
                            let card_metric = card.metric;
                            rsx! {
                                InfoBox {
                                    key: "{card_metric}",
                                    card,
                                    loading: view.loading,
                                    onclick: move |_| dashboard.select_metric(card_metric),
                                }
                            }
                        }
                    }
                }

                StatsMap {
                    markers: view.markers.clone(),
                    viewport: view.viewport,
                    selected,
                }
            }

            div { class: "app__right",
                h3 { "Live {metric} by Country" }
                RegionTable { rows: view.table.clone() }
                h3 { class: "app__graph-title", "Worldwide new {metric}" }
                LineGraph { series: view.series.clone(), metric }
            }
        }
    }
}
