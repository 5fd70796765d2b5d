mod server;

#[tokio::main]
async fn main() {
    if let Err(error) = server::run().await {
        tracing::error!(%error, "Turbo service error! Process stopped");
    }
}
