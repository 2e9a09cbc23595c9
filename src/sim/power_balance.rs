//! Feeder power balance computation.

/// Computes transformer net load from the household raw load and the EV
/// fleet's net contribution.
///
/// `ev_net_w` follows the contribution convention:
/// - Positive = power given back to the feeder (V2G)
/// - Negative = power drawn from the feeder (charging)
///
/// so charging raises the net load and V2G lowers it.
///
/// # Arguments
///
/// * `raw_load_w` - Appliance demand (positive)
/// * `ev_net_w` - EV contribution (positive=V2G, negative=charging)
///
/// # Returns
///
/// Net transformer load in W (positive=import, negative=export)
pub fn feeder_net_w(raw_load_w: f64, ev_net_w: f64) -> f64 {
    raw_load_w - ev_net_w
}
