#[tokio::main]
async fn main() {
    if let Err(e) = careclip_lib::run().await {
        tracing::error!("Careclip failed: {e}");
        eprintln!("careclip: {e}");
        std::process::exit(1);
    }
}
