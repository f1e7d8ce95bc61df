#[tokio::main]
async fn main() {
    if let Err(e) = proxy_lib::run().await {
        log::error!("Fatal error: {}", e);
        eprintln!("invidious-proxy: {}", e);
        std::process::exit(1);
    }
}
