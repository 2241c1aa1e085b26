#![allow(non_snake_case)]

pub mod chart;
pub mod components;
pub mod config;
pub mod error;
pub mod format;
pub mod hooks;
pub mod models;
pub mod orchestrator;
pub mod projection;
pub mod ranking;
pub mod services;
pub mod state;
pub mod views;

use dioxus::desktop::{Config, LogicalSize, WindowBuilder};
use dioxus::prelude::*;

use state::AppStateProvider;
use views::dashboard::Dashboard;

pub const WINDOW_WIDTH: f64 = 1280.0;
pub const WINDOW_HEIGHT: f64 = 820.0;

pub fn App() -> Element {
    rsx! {
        document::Stylesheet { href: asset!("/assets/dashboard.css") }
        AppStateProvider { Dashboard {} }
    }
}

pub fn run_app() {
    tracing_subscriber::fmt::init();

    let config = Config::new()
        .with_window(
            WindowBuilder::new()
                .with_title("COVID-19 Tracker")
                .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
                .with_resizable(true),
        )
        .with_menu(None);

    LaunchBuilder::new().with_cfg(config).launch(App);
}
