use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryPersonRepository, LoggingDispatcher};
use crate::routes::with_compliance_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use minder_compliance::compliance::{ComplianceSweep, NotificationDispatcher, PersonRepository};
use minder_compliance::config::AppConfig;
use minder_compliance::error::AppError;
use minder_compliance::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = match &config.sweep.roster_path {
        Some(path) => InMemoryPersonRepository::from_roster(path)?,
        None => InMemoryPersonRepository::default(),
    };
    let people = repository.len();
    let sweep = Arc::new(ComplianceSweep::new(
        Arc::new(repository),
        Arc::new(LoggingDispatcher::default()),
    ));

    if let Some(period) = config.sweep.interval() {
        spawn_scheduled_sweep(sweep.clone(), period);
    }

    let app = with_compliance_routes(sweep)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, people, "childminder compliance service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Sweep on a fixed period. Ticks that land while a sweep is still running are skipped.
fn spawn_scheduled_sweep<R, N>(sweep: Arc<ComplianceSweep<R, N>>, period: Duration)
where
    R: PersonRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    info!(period_secs = period.as_secs(), "scheduled compliance sweep enabled");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let sweep = sweep.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                let today = sweep.today();
                sweep.run_exclusive(today)
            })
            .await;

            match outcome {
                Ok(Ok(summary)) => info!(
                    today = %summary.today,
                    checked = summary.checked,
                    notified = summary.notified,
                    errors = summary.errors.len(),
                    "scheduled compliance sweep completed"
                ),
                Ok(Err(busy)) => warn!(%busy, "scheduled compliance sweep skipped"),
                Err(error) => warn!(%error, "scheduled compliance sweep task failed"),
            }
        }
    });
}
