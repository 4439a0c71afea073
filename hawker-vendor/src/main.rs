use clap::Parser;
use hawker_protocol::RpcServer;
use hawker_vendor::{VendorConfig, VendorService};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hawker_vendor=info".parse()?)
                .add_directive("hawker_protocol=info".parse()?),
        )
        .init();

    let config = VendorConfig::parse();

    info!(
        vendor_name = %config.vendor_name,
        port = config.port,
        "starting vendor backend"
    );

    let server = RpcServer::bind(&config.listen_addr(), VendorService::new(&config.vendor_name))
        .await?;
    info!(addr = %server.local_addr()?, "vendor backend listening");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("shutting down vendor backend"),
    }
    Ok(())
}
