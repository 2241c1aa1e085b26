use crate::hooks::use_dashboard;
use crate::models::Viewport;
use crate::projection::{to_canvas, view_box, MapMarker, ViewBox, MAP_HEIGHT, MAP_WIDTH};
use dioxus::prelude::*;

const ANIMATION_SPEED: f64 = 0.1;
const COLOR_SELECTED: &str = "var(--color-foreground)";

#[component]
pub fn StatsMap(markers: Vec<MapMarker>, viewport: Viewport, selected: String) -> Element {
    let dashboard = use_dashboard();
    let target = view_box(&viewport);
    let mut current_view = use_signal(|| target);

    use_effect(use_reactive((&target,), move |(target,)| {
        spawn(async move {
            let mut steps = 0;
            loop {
                let cur = *current_view.peek();
                let next = ViewBox {
                    x: cur.x + (target.x - cur.x) * ANIMATION_SPEED,
                    y: cur.y + (target.y - cur.y) * ANIMATION_SPEED,
                    width: cur.width + (target.width - cur.width) * ANIMATION_SPEED,
                    height: cur.height + (target.height - cur.height) * ANIMATION_SPEED,
                };

                if (next.x - target.x).abs() < 0.1
                    && (next.y - target.y).abs() < 0.1
                    && (next.width - target.width).abs() < 0.1
                {
                    current_view.set(target);
                    break;
                }

                current_view.set(next);
                tokio::time::sleep(std::time::Duration::from_millis(16)).await;

                steps += 1;
                if steps > 200 {
                    current_view.set(target);
                    break;
                }
            }
        });
    }));

    let view_box_attr = current_view.read().to_attr();

    rsx! {
        div { class: "map",
            svg { class: "map__canvas", view_box: "{view_box_attr}",
                rect {
                    x: "0",
                    y: "0",
                    width: "{MAP_WIDTH}",
                    height: "{MAP_HEIGHT}",
                    class: "map__ocean",
                }

                for marker in markers.into_iter() {
                    {
                        let (cx, cy) = to_canvas(marker.coordinate);
                        let is_selected = marker.code.as_deref() == Some(selected.as_str());
                        let code = marker.code.clone();
                        let tip = format!(
                            "{}\nCases: {}\nRecovered: {}\nDeaths: {}",
                            marker.tooltip.name,
                            marker.tooltip.cases,
                            marker.tooltip.recovered,
                            marker.tooltip.deaths,
                        );
                        rsx! {
                            g {
                                key: "{marker.tooltip.name}",
                                class: "map__marker",
                                onclick: move |_| {
                                    if let Some(code) = code.clone() {
                                        dashboard.select_region(code);
                                    }
                                },
                                circle {
                                    cx: "{cx:.2}",
                                    cy: "{cy:.2}",
                                    r: "{marker.radius:.2}",
                                    fill: "{marker.color}",
                                    opacity: "0.45",
                                    stroke: if is_selected { COLOR_SELECTED } else { marker.color },
                                    stroke_width: if is_selected { "1.5" } else { "0.5" },
                                }
                                title { "{tip}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
