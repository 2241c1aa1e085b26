use crate::config::{DashboardConfig, DEFAULT_API_ROOT};
use crate::models::MetricKind;
use crate::orchestrator::{DashboardState, DashboardView, Orchestrator};
use crate::services::ProductionStatsService;
use dioxus::prelude::*;
use futures_util::StreamExt;
use tracing::{error, info, warn};

pub enum DashboardAction {
    SelectRegion(String),
    SelectMetric(MetricKind),
    Retry,
}

#[derive(Clone, Copy)]
pub struct DashboardContext {
    pub view: Signal<DashboardView>,
    pub actions: Coroutine<DashboardAction>,
    pub available: bool,
}

fn load_config() -> DashboardConfig {
    DashboardConfig::from_env().unwrap_or_else(|e| {
        error!("{}; using {}", e, DEFAULT_API_ROOT);
        DashboardConfig {
            api_root: DEFAULT_API_ROOT.to_string(),
            ..DashboardConfig::default()
        }
    })
}

#[component]
pub fn AppStateProvider(children: Element) -> Element {
    let config = use_hook(load_config);
    let orchestrator = use_hook(|| match ProductionStatsService::new(config.clone()) {
        Ok(service) => Some(Orchestrator::new(service, config.history_days)),
        Err(e) => {
            error!("Failed to build statistics client: {}", e);
            None
        }
    });

    let mut view = use_signal(|| DashboardState::default().view());

    let listener = orchestrator.clone();
    use_future(move || {
        let listener = listener.clone();
        async move {
            let Some(dashboard) = listener else {
                return;
            };
            let mut rx = dashboard.subscribe();
            let initial = rx.borrow_and_update().view();
            view.set(initial);
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().view();
                view.set(next);
            }
        }
    });

    let init = orchestrator.clone();
    use_future(move || {
        let init = init.clone();
        async move {
            if let Some(dashboard) = init {
                dashboard.initialize().await;
            }
        }
    });

    let refresher = orchestrator.clone();
    let refresh_interval = config.refresh_interval;
    use_future(move || {
        let refresher = refresher.clone();
        async move {
            if let (Some(dashboard), Some(interval)) = (refresher, refresh_interval) {
                info!("Refreshing every {:?}", interval);
                dashboard.run_refresh_loop(interval).await;
            }
        }
    });

    let actor = orchestrator.clone();
    let actions = use_coroutine(move |mut rx: UnboundedReceiver<DashboardAction>| {
        let actor = actor.clone();
        async move {
            let Some(dashboard) = actor else {
                return;
            };
            while let Some(action) = rx.next().await {
                match action {
                    // Each selection runs on its own task so overlapping
                    // requests stay in flight; the ticket decides who wins.
                    DashboardAction::SelectRegion(code) => {
                        let dashboard = dashboard.clone();
                        spawn(async move {
                            if let Err(e) = dashboard.select_region(&code).await {
                                warn!("Selection {} rejected: {}", code, e);
                            }
                        });
                    }
                    DashboardAction::SelectMetric(metric) => dashboard.select_metric(metric),
                    DashboardAction::Retry => {
                        let dashboard = dashboard.clone();
                        spawn(async move { dashboard.retry().await });
                    }
                }
            }
        }
    });

    let available = orchestrator.is_some();
    use_context_provider(|| DashboardContext {
        view,
        actions,
        available,
    });

    rsx! {
        {children}
    }
}
