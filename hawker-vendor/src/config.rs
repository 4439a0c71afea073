//! Vendor backend configuration.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "hawker-vendor")]
#[command(about = "Simulated vendor backend for the hawker platform")]
pub struct VendorConfig {
    /// Display name of this vendor; the wire vendor_id is its slug.
    #[arg(long, env = "VENDOR_NAME", default_value = "MockVendor")]
    pub vendor_name: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 9101)]
    pub port: u16,
}

impl VendorConfig {
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
