#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = assignments_api::run().await {
        eprintln!("assignments-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
