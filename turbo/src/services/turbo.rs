use crate::{
    extensions::FromRequest,
    proto::turbo_server::{Turbo as GrpcService, TurboServer},
    store::{self, parse_id, Context, Operation, Store, Turbo},
};
pub use crate::proto::{
    CreateTurboRequest, DeleteTurboRequest, GetTurboRequest, PingRequest, PingResponse,
    TurboResponse, UpdateTurboRequest,
};
use super::database_is_up;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use uuid::Uuid;

/// gRPC handlers for turbos, backed by a shared Store
#[derive(Clone)]
pub struct TurboService {
    store: Arc<Store>,
}

impl TurboService {
    /// Create a new turbo service from a reference-counted Store
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

/// gRPC service implementation for the Turbo service
#[tonic::async_trait]
impl GrpcService for TurboService {
    #[tracing::instrument(skip(self, request))]
    async fn ping(&self, request: Request<PingRequest>) -> Result<Response<PingResponse>, Status> {
        let PingRequest { data } = request.into_inner();

        tracing::info!(%data, "Received ping");

        let status = if database_is_up(&self.store).await {
            "up"
        } else {
            "down"
        };

        Ok(Response::new(PingResponse {
            data: format!("Data: {data}; Database: {status}"),
        }))
    }

    #[tracing::instrument(skip(self, request), err)]
    async fn create_turbo(
        &self,
        request: Request<CreateTurboRequest>,
    ) -> Result<Response<TurboResponse>, Status> {
        let context = Context::from_request(&request)?;
        let request = request.into_inner();

        // generate IDs for callers that don't bring their own
        let id = if request.turbo_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            request.turbo_id.clone()
        };

        let turbo = Turbo::from_proto(&id, &request)?;

        tracing::debug!(%turbo, "Creating turbo");

        // insert and read back the new row atomically, all within the caller's deadline
        let created = context
            .run(async {
                let mut client = self.store.connection().await?;
                let transaction = client.transaction().await?;
                let scoped = context.with_transaction(&transaction);

                self.store.create_tx(&scoped, &turbo).await?;
                let created = self.store.get_tx(&scoped, turbo.id).await?;

                transaction.commit().await?;

                Ok::<_, store::Error>(created)
            })
            .await
            .unwrap_or_else(|_| Err(store::Error::Timeout.wrap(Operation::Create, &turbo)))?;

        Ok(Response::new(created.into()))
    }

    #[tracing::instrument(skip(self, request), err)]
    async fn get_turbo(
        &self,
        request: Request<GetTurboRequest>,
    ) -> Result<Response<TurboResponse>, Status> {
        let context = Context::from_request(&request)?;
        let id = parse_id(&request.get_ref().turbo_id)?;

        let turbo = self.store.get(&context, id).await?;

        Ok(Response::new(turbo.into()))
    }

    #[tracing::instrument(skip(self, request), err)]
    async fn update_turbo(
        &self,
        request: Request<UpdateTurboRequest>,
    ) -> Result<Response<TurboResponse>, Status> {
        let context = Context::from_request(&request)?;
        let request = request.into_inner();
        let turbo = Turbo::from_proto(&request.turbo_id, &request)?;

        tracing::debug!(%turbo, "Updating turbo");

        // update and read back the changed row atomically, all within the caller's deadline
        let updated = context
            .run(async {
                let mut client = self.store.connection().await?;
                let transaction = client.transaction().await?;
                let scoped = context.with_transaction(&transaction);

                self.store.update_tx(&scoped, &turbo).await?;
                let updated = self.store.get_tx(&scoped, turbo.id).await?;

                transaction.commit().await?;

                Ok::<_, store::Error>(updated)
            })
            .await
            .unwrap_or_else(|_| Err(store::Error::Timeout.wrap(Operation::Update, &turbo)))?;

        Ok(Response::new(updated.into()))
    }

    #[tracing::instrument(skip(self, request), err)]
    async fn delete_turbo(
        &self,
        request: Request<DeleteTurboRequest>,
    ) -> Result<Response<()>, Status> {
        let context = Context::from_request(&request)?;
        let id = parse_id(&request.get_ref().turbo_id)?;

        self.store.delete(&context, id).await?;

        Ok(Response::new(()))
    }
}

/// Create a new Turbo service from a Store
pub fn new(store: Arc<Store>) -> TurboServer<TurboService> {
    TurboServer::new(TurboService::new(store))
}

#[cfg(test)]
mod test {
    use super::{
        CreateTurboRequest, GetTurboRequest, GrpcService, PingRequest, TurboService,
        UpdateTurboRequest,
    };
    use crate::store::Store;
    use std::{net::TcpListener, sync::Arc, time::Duration};
    use tonic::{metadata::MetadataValue, Code, Request, Status};
    use tracing_test::traced_test;

    const TURBO_ID: &str = "72bc87f3-4a9f-4d05-93fe-844d3cd94c65";

    fn service() -> TurboService {
        TurboService::new(Arc::new(Store::lazy()))
    }

    /// a service whose database accepts connections but never answers them
    fn stalled_service() -> (TcpListener, TurboService) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        (listener, TurboService::new(Arc::new(Store::lazy_at(port))))
    }

    fn with_deadline<T>(message: T) -> Request<T> {
        let mut request = Request::new(message);
        request
            .metadata_mut()
            .insert("grpc-timeout", MetadataValue::from_static("50m"));

        request
    }

    async fn expect_deadline_exceeded<F>(call: F)
    where
        F: std::future::Future<Output = Result<tonic::Response<super::TurboResponse>, Status>>,
    {
        let status = tokio::time::timeout(Duration::from_secs(5), call)
            .await
            .expect("Call outlived its deadline")
            .expect_err("Stalled database answered");

        assert_eq!(status.code(), Code::DeadlineExceeded);
    }

    #[tokio::test]
    #[traced_test]
    async fn pings_report_unreachable_databases_as_down() {
        let response = service()
            .ping(Request::new(PingRequest {
                data: "hello".into(),
            }))
            .await
            .expect("Ping failed outright")
            .into_inner();

        assert_eq!(response.data, "Data: hello; Database: down");
        assert!(logs_contain("Received ping"));
    }

    #[tokio::test]
    async fn rejects_malformed_ids_before_touching_the_database() {
        let status = service()
            .get_turbo(Request::new(GetTurboRequest {
                turbo_id: "not-a-turbo".into(),
            }))
            .await
            .expect_err("Accepted a malformed ID");

        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn bounds_transactional_creates_by_the_request_deadline() {
        let (_listener, service) = stalled_service();

        expect_deadline_exceeded(service.create_turbo(with_deadline(CreateTurboRequest {
            turbo_id: TURBO_ID.into(),
            name: "Foobar".into(),
        })))
        .await;
    }

    #[tokio::test]
    async fn bounds_transactional_updates_by_the_request_deadline() {
        let (_listener, service) = stalled_service();

        expect_deadline_exceeded(service.update_turbo(with_deadline(UpdateTurboRequest {
            turbo_id: TURBO_ID.into(),
            name: "Bazqux".into(),
        })))
        .await;
    }
}
