use clap::Parser;
use hawker_checkout::{CheckoutConfig, CheckoutService};
use hawker_protocol::RpcServer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hawker_checkout=info".parse()?)
                .add_directive("hawker_protocol=info".parse()?),
        )
        .init();

    let config = CheckoutConfig::parse();

    info!(
        port = config.port,
        pay_failure_rate = config.pay_failure_rate,
        confirm_failure_rate = config.confirm_failure_rate,
        "starting checkout engine"
    );

    let server = RpcServer::bind(
        &config.listen_addr(),
        CheckoutService::new(config.tuning()),
    )
    .await?;
    info!(addr = %server.local_addr()?, "checkout engine listening");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("shutting down checkout engine"),
    }
    Ok(())
}
