// Named, bb8-backed data sources.
//
// - options: `PoolOptions` (serde-configurable) and its builder
// - source: `DataSource`, one pool plus its close state
// - registry: `DataSourceRegistry`, the name -> data source map

mod options;
mod registry;
mod source;

pub use options::{PoolOptions, PoolOptionsBuilder};
pub use registry::{DEFAULT_POOL_NAME, DataSourceRegistry};
pub use source::DataSource;
