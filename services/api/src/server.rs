use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryIntake};
use crate::routes::with_form_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use freedom_riders::config::AppConfig;
use freedom_riders::error::AppError;
use freedom_riders::telemetry;
use freedom_riders::workflows::fare::FareEstimator;
use freedom_riders::workflows::rider_application::{
    ApplicationIntake, FormSessionStore, HttpIntake,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    if args.dry_run {
        info!("dry run: applications are kept in memory");
        serve(config, Arc::new(InMemoryIntake::default())).await
    } else {
        let intake = HttpIntake::new(&config.intake)?;
        info!(endpoint = intake.endpoint(), "delivering applications over HTTP");
        serve(config, Arc::new(intake)).await
    }
}

async fn serve<I>(config: AppConfig, intake: Arc<I>) -> Result<(), AppError>
where
    I: ApplicationIntake + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(FormSessionStore::new(intake));
    let _sweeper = spawn_idle_sweeper(store.clone(), config.sessions.idle_timeout);
    let estimator = Arc::new(FareEstimator::default());

    let app = with_form_routes(store, estimator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "freedom rider service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn sweep_period(idle_timeout: Duration) -> Duration {
    (idle_timeout / 4).clamp(Duration::from_millis(10), Duration::from_secs(60))
}

/// Periodically drops application forms nobody touched within `idle_timeout`.
pub(crate) fn spawn_idle_sweeper<I>(
    store: Arc<FormSessionStore<I>>,
    idle_timeout: Duration,
) -> JoinHandle<()>
where
    I: ApplicationIntake + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_period(idle_timeout));
        loop {
            ticker.tick().await;
            let purged = store.purge_idle(idle_timeout).await;
            if purged > 0 {
                info!(purged, "expired idle application forms");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_period_is_a_fraction_of_the_idle_timeout() {
        assert_eq!(sweep_period(Duration::from_secs(1800)), Duration::from_secs(60));
        assert_eq!(sweep_period(Duration::from_secs(40)), Duration::from_secs(10));
        assert_eq!(sweep_period(Duration::from_millis(8)), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn sweeper_expires_abandoned_forms() {
        let store = Arc::new(FormSessionStore::new(Arc::new(InMemoryIntake::default())));
        let kept = Arc::new(FormSessionStore::new(Arc::new(InMemoryIntake::default())));
        store.open().await;
        kept.open().await;

        let sweeper = spawn_idle_sweeper(store.clone(), Duration::from_millis(40));
        let idle = spawn_idle_sweeper(kept.clone(), Duration::from_secs(1800));
        tokio::time::sleep(Duration::from_millis(300)).await;
        sweeper.abort();
        idle.abort();

        assert!(store.is_empty().await);
        assert_eq!(kept.len().await, 1);
    }
}
