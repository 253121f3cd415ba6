#[tokio::main]
async fn main() -> anyhow::Result<()> {
    petmeds_api::run().await
}
