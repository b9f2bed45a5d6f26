#[tokio::main]
async fn main() -> anyhow::Result<()> {
    object_permissions::run().await
}
