use serde::{Deserialize, Serialize};

/// Bus route record, owned by the external catalog service. Carries the leg
/// and schedule details the notification templates render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusRoute {
    pub id: String,
    pub bus_id: String,
    pub bus_unit_id: String,
    pub from_route: String,
    pub to_route: String,
    pub departure_time: String,
    pub arrival_time: String,
}
