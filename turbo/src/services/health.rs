use super::{database_is_up, turbo::TurboService};
use crate::{proto::turbo_server::TurboServer, store::Store};
use std::{sync::Arc, time::Duration};
use tonic_health::{server::HealthReporter, ServingStatus};

/// Report the Turbo service as serving only while its database answers pings
#[tracing::instrument(skip(store, reporter))]
pub async fn check(store: &Store, reporter: &mut HealthReporter) -> ServingStatus {
    if database_is_up(store).await {
        reporter.set_serving::<TurboServer<TurboService>>().await;

        ServingStatus::Serving
    } else {
        reporter.set_not_serving::<TurboServer<TurboService>>().await;

        ServingStatus::NotServing
    }
}

/// Re-check the database forever, pausing for `interval` between checks
pub async fn watch(store: Arc<Store>, mut reporter: HealthReporter, interval: Duration) {
    loop {
        check(&store, &mut reporter).await;
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod test {
    use super::check;
    use crate::store::Store;
    use tonic_health::{server::health_reporter, ServingStatus};
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn reports_unreachable_databases_as_not_serving() {
        let (mut reporter, _service) = health_reporter();

        let status = check(&Store::lazy(), &mut reporter).await;

        assert_eq!(status, ServingStatus::NotServing);
        assert!(logs_contain("Database ping failed"));
    }
}
