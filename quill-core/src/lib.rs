mod as_value;
mod cache;
mod config;
mod connection;
mod descriptor;
mod dialect;
mod driver;
mod error;
mod executor;
mod prepared;
mod query;
mod resolve;
mod template;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use cache::*;
pub use config::*;
pub use connection::*;
pub use descriptor::*;
pub use dialect::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use prepared::*;
pub use query::*;
pub use resolve::*;
pub use template::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;
