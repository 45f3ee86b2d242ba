use std::future::Future;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::handlers::router;
use crate::metrics::setup_metrics_recorder;
use crate::source::HttpBatchSource;
use crate::store::PgEventStore;

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = PgEventStore::new(&config.database_url, config.max_pg_connections)
        .await
        .context("failed to connect to the event store")?;

    let source = HttpBatchSource::new(
        config.batch_source_url.clone(),
        config.batch_request_timeout.0,
        config.max_batch_bytes,
    )
    .context("failed to create batch source")?;

    let metrics = config.export_prometheus.then(setup_metrics_recorder);

    let app = router(
        store,
        source,
        config.min_autocomplete_prefix,
        config.max_event_bytes,
        metrics,
    );

    tracing::info!("listening on {:?}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
