pub mod config;
pub mod node;
pub mod tracing;

pub use config::load_config;
pub use node::GreeterNode;
pub use tracing::init_tracing_subscriber;
