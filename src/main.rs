#[tokio::main]
async fn main() -> anyhow::Result<()> {
    netusage_lib::run().await
}
