//! Checkout engine configuration.

use crate::workflow::WorkflowTuning;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "hawker-checkout")]
#[command(about = "Checkout workflow engine for the hawker platform")]
pub struct CheckoutConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 9200)]
    pub port: u16,

    /// Synthetic payment failure probability per non-final attempt.
    #[arg(long, env = "PAY_FAILURE_RATE", default_value_t = 0.2)]
    pub pay_failure_rate: f64,

    /// Synthetic confirmation failure probability.
    #[arg(long, env = "CONFIRM_FAILURE_RATE", default_value_t = 0.05)]
    pub confirm_failure_rate: f64,
}

impl CheckoutConfig {
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn tuning(&self) -> WorkflowTuning {
        WorkflowTuning {
            pay_failure_rate: self.pay_failure_rate,
            confirm_failure_rate: self.confirm_failure_rate,
            ..WorkflowTuning::default()
        }
    }
}
