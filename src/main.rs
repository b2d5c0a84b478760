use rask_log_transport::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::main().await
}
