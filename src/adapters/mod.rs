//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                 |
//! |------------|--------------------|-----------------------------|
//! | `log_sink` | EventSink          | Log output                  |
//! | `nvs`      | ConfigPort         | In-memory key-value store   |
//! |            | StoragePort        |                             |
//! | `sim`      | SensorPort         | Simulated kitchen model     |
//! |            | ActuatorPort       |                             |
//! |            | HazardPort         |                             |
//! |            | DashboardPort      |                             |
//! | `time`     | Clock              | Host / scaled wall clock    |

pub mod log_sink;
pub mod nvs;
pub mod sim;
pub mod time;
