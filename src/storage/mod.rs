pub mod csv;
pub mod flux;
pub mod gateway;
pub mod influx;
pub mod line_protocol;
pub mod memory;

pub use csv::FluxRecord;
pub use gateway::{GatewayError, TimeSeriesGateway};
pub use influx::InfluxGateway;
pub use memory::{MemoryGateway, StoredEvent};
