use configuration::Configuration;
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tonic::transport::Server;
use turbo::{services, store};

mod configuration;
mod logging;

/// Pause between database checks backing the gRPC health service
#[cfg(feature = "health")]
const HEALTH_CHECK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error reading configuration from environment: {0}")]
    Environment(#[from] envy::Error),
    #[error(transparent)]
    Store(#[from] store::ConfigurationError),
    #[cfg(feature = "reflection")]
    #[error("Error configuring gRPC reflection: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),
    #[error("Error setting up SIGTERM handler: {0}")]
    SigTerm(#[from] std::io::Error),
    #[error("Error in gRPC transport: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// Run the app in a Result-contained function
pub(crate) async fn run() -> Result<(), Error> {
    // configure logging
    tracing_subscriber::fmt::init();

    // handle SIGTERM-based termination gracefully
    let configuration: Configuration = envy::from_env()?;
    let grace_period = configuration.termination_period();
    let mut termination = signal(SignalKind::terminate())?;

    let shutdown = async move {
        termination.recv().await;

        tracing::info!("SIGTERM heard in Turbo service");

        if let Some(grace_period) = grace_period {
            tracing::info!(
                grace_period_seconds = grace_period.as_secs(),
                "Waiting for graceful termination period before shutdown"
            );

            tokio::time::sleep(grace_period).await;
        }

        tracing::info!("Shutting down Turbo service");
    };

    // parse the service address from configuration
    let address = SocketAddr::from(&configuration);

    // build a shared store from configuration
    let store = envy::from_env::<store::Configuration>()?
        .create_store()
        .map(Arc::new)?;

    let turbo_service = services::turbo::new(Arc::clone(&store));

    tracing::info!(%address, "Turbo service starting");

    let mut server = Server::builder();

    if let Some(request_timeout) = configuration.request_timeout() {
        server = server.timeout(request_timeout);
    }

    #[cfg(feature = "web")]
    {
        server = server.accept_http1(true);
    }

    // keep the reported health in step with the database
    #[cfg(feature = "health")]
    let (health_reporter, health_service) = tonic_health::server::health_reporter();

    #[cfg(feature = "health")]
    {
        tokio::spawn(services::health::watch(
            Arc::clone(&store),
            health_reporter,
            HEALTH_CHECK_INTERVAL,
        ));
    }

    let mut router = server.layer(logging::create()).add_service({
        #[cfg(feature = "web")]
        {
            tonic_web::enable(turbo_service)
        }
        #[cfg(not(feature = "web"))]
        {
            turbo_service
        }
    });

    #[cfg(feature = "reflection")]
    {
        #[allow(unused_mut)]
        let mut reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(turbo::FILE_DESCRIPTOR_SET);

        #[cfg(feature = "health")]
        {
            reflection = reflection.register_encoded_file_descriptor_set(
                tonic_health::proto::GRPC_HEALTH_V1_FILE_DESCRIPTOR_SET,
            );
        }

        router = router.add_service(reflection.build()?);
    }

    #[cfg(feature = "health")]
    {
        router = router.add_service({
            #[cfg(feature = "web")]
            {
                tonic_web::enable(health_service)
            }
            #[cfg(not(feature = "web"))]
            {
                health_service
            }
        });
    }

    router.serve_with_shutdown(address, shutdown).await?;

    tracing::info!(%address, "Turbo service stopped");

    Ok(())
}
