pub mod config;
pub mod error;
pub mod telemetry;

pub use config::{load_dotenv, HtmlConfig, SquashConfig, ThrottleConfig};
pub use error::CoreError;
pub use telemetry::init_tracing;
