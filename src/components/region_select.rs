use crate::hooks::use_dashboard;
use crate::models::RegionOption;
use dioxus::prelude::*;

#[component]
pub fn RegionSelect(options: Vec<RegionOption>, value: String) -> Element {
    let dashboard = use_dashboard();

    rsx! {
        select {
            class: "region-select",
            value: "{value}",
            onchange: move |e: FormEvent| dashboard.select_region(e.value()),
            for opt in options {
                option {
                    key: "{opt.value}",
                    value: "{opt.value}",
                    selected: opt.value == value,
                    "{opt.name}"
                }
            }
        }
    }
}
