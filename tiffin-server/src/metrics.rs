//! Prometheus exporter.

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global recorder and return a handle for rendering the
/// `/metrics` endpoint.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!(
        "tiffin_otp_challenges_issued",
        "Email passcodes issued, including replacements"
    );
    metrics::describe_counter!(
        "tiffin_otp_challenges_verified",
        "Passcodes accepted and spent"
    );
    metrics::describe_counter!(
        "tiffin_otp_challenges_failed",
        "Passcode checks that were wrong, expired or for nothing pending"
    );
    metrics::describe_counter!("tiffin_grants_issued", "Password reset grants recorded");
    metrics::describe_counter!("tiffin_grants_consumed", "Password reset grants spent");

    Ok(handle)
}
