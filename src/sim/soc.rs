//! State-of-charge transition between consecutive market slots.

use super::types::ModelConfig;

/// Returns the SOC vector after one slot.
///
/// Assets flagged in `used_for_fcr` lose a fixed `degradation * soc_mean`
/// regardless of their own SOC or power; all others gain
/// `recharge_rate * soc_mean`. The result is clamped at zero and, if the
/// model sets one, at the SOC cap. Without a cap, SOC of idle assets grows
/// without bound.
///
/// # Arguments
///
/// * `config` - Validated model configuration
/// * `socs` - Current SOC per asset (kWh)
/// * `used_for_fcr` - Whether each asset delivered FCR this slot
///
/// # Panics
///
/// Panics if `socs` and `used_for_fcr` differ in length.
pub fn update_soc(config: &ModelConfig, socs: &[f64], used_for_fcr: &[bool]) -> Vec<f64> {
    assert_eq!(
        socs.len(),
        used_for_fcr.len(),
        "SOC and usage mask must have one entry per asset"
    );

    let discharge = config.discharge_step_kwh();
    let recharge = config.recharge_step_kwh();
    let cap = config.params().soc_cap_kwh.unwrap_or(f64::INFINITY);

    socs.iter()
        .zip(used_for_fcr)
        .map(|(&soc, &used)| {
            let delta = if used { -discharge } else { recharge };
            (soc + delta).max(0.0).min(cap)
        })
        .collect()
}
