#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = cactus_quiz::run().await {
        eprintln!("cactus-quiz fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
