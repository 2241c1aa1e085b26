use crate::hooks::use_dashboard;
use crate::orchestrator::TableRow;
use dioxus::prelude::*;

#[component]
pub fn RegionTable(rows: Vec<TableRow>) -> Element {
    let dashboard = use_dashboard();

    rsx! {
        div { class: "table custom-scrollbar",
            for row in rows {
                {
                    let code = row.code.clone();
                    rsx! {
                        div {
                            key: "{row.name}",
                            class: "table__row",
                            class: if row.selected { "table__row--selected" },
                            onclick: move |_| {
                                if let Some(code) = code.clone() {
                                    dashboard.select_region(code);
                                }
                            },
                            span { class: "table__name", "{row.name}" }
                            strong { class: "table__total", "{row.total}" }
                        }
                    }
                }
            }
        }
    }
}
