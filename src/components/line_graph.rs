use crate::chart::{path_data, ChartPoint};
use crate::models::MetricKind;
use dioxus::prelude::*;

const GRAPH_WIDTH: f64 = 320.0;
const GRAPH_HEIGHT: f64 = 160.0;

#[component]
pub fn LineGraph(series: Vec<ChartPoint>, metric: MetricKind) -> Element {
    if series.is_empty() {
        return rsx! {
            div { class: "graph graph--empty", "No history available" }
        };
    }

    let d = path_data(&series, GRAPH_WIDTH, GRAPH_HEIGHT);
    let color = metric.color();
    let first = series.first().map(|p| p.date.format("%b %d").to_string()).unwrap_or_default();
    let last = series.last().map(|p| p.date.format("%b %d").to_string()).unwrap_or_default();

    rsx! {
        div { class: "graph",
            svg {
                class: "graph__canvas",
                view_box: "0 0 {GRAPH_WIDTH} {GRAPH_HEIGHT}",
                preserve_aspect_ratio: "none",
                path {
                    d: "{d}",
                    fill: "none",
                    stroke: "{color}",
                    stroke_width: "2",
                }
            }
            div { class: "graph__axis",
                span { "{first}" }
                span { "{last}" }
            }
        }
    }
}
