use std::time::Duration;
use tonic::{codegen::http::Request as HttpRequest, Code};
use tower_http::{
    classify::{GrpcErrorsAsFailures, GrpcFailureClass, SharedClassifier},
    trace::{
        DefaultOnBodyChunk, DefaultOnEos, DefaultOnRequest, DefaultOnResponse, MakeSpan, OnFailure,
        TraceLayer,
    },
};

/// Custom HTTP trace layer for logging gRPC requests appropriately
type LoggingLayer = TraceLayer<
    SharedClassifier<GrpcErrorsAsFailures>,
    TurboSpan,
    DefaultOnRequest,
    DefaultOnResponse,
    DefaultOnBodyChunk,
    DefaultOnEos,
    TurboFailure,
>;

/// Span creation handler for Turbo request/response traces
#[derive(Clone)]
pub struct TurboSpan;

impl<B> MakeSpan<B> for TurboSpan {
    fn make_span(&mut self, request: &HttpRequest<B>) -> tracing::Span {
        let headers = request.headers();
        let method = request.uri().path();
        let user_agent = headers
            .get("user-agent")
            .and_then(|header| header.to_str().ok())
            .unwrap_or_default();
        let timeout = headers
            .get("grpc-timeout")
            .and_then(|header| header.to_str().ok())
            .unwrap_or_default();

        tracing::info_span!("turbo", %method, %user_agent, %timeout)
    }
}

/// Failure handler that separates caller mistakes from service faults
#[derive(Clone)]
pub struct TurboFailure;

impl OnFailure<GrpcFailureClass> for TurboFailure {
    fn on_failure(&mut self, failure: GrpcFailureClass, latency: Duration, _span: &tracing::Span) {
        let latency = format!("{} ms", latency.as_millis());

        match failure {
            GrpcFailureClass::Code(code) => {
                let code = Code::from_i32(code.into());
                let description = code.description();

                match code {
                    // missing, duplicate, or malformed turbos are the caller's problem
                    Code::NotFound
                    | Code::AlreadyExists
                    | Code::InvalidArgument
                    | Code::DeadlineExceeded
                    | Code::Cancelled => {
                        tracing::warn!(?code, %description, %latency)
                    }
                    _ => {
                        tracing::error!(?code, %description, %latency)
                    }
                }
            }
            GrpcFailureClass::Error(error) => {
                tracing::error!(%error, %latency)
            }
        }
    }
}

/// Create a logging middleware layer for a gRPC service
pub fn create() -> LoggingLayer {
    TraceLayer::new_for_grpc()
        .make_span_with(TurboSpan)
        .on_failure(TurboFailure)
}
