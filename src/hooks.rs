use crate::models::MetricKind;
use crate::orchestrator::DashboardView;
use crate::state::{DashboardAction, DashboardContext};
use dioxus::prelude::*;

/// Handle for emitting user intents to the dashboard.
#[derive(Clone, Copy)]
pub struct DashboardClient {
    ctx: DashboardContext,
}

impl DashboardClient {
    pub fn select_region(&self, value: String) {
        self.ctx.actions.send(DashboardAction::SelectRegion(value));
    }

    pub fn select_metric(&self, metric: MetricKind) {
        self.ctx.actions.send(DashboardAction::SelectMetric(metric));
    }

    pub fn retry(&self) {
        self.ctx.actions.send(DashboardAction::Retry);
    }

    pub fn available(&self) -> bool {
        self.ctx.available
    }
}

pub fn use_dashboard() -> DashboardClient {
    let ctx = use_context::<DashboardContext>();
    DashboardClient { ctx }
}

pub fn use_dashboard_view() -> DashboardView {
    let ctx = use_context::<DashboardContext>();
    (ctx.view)()
}
