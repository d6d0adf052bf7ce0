pub mod buy;
pub mod create;
pub mod initialize;
pub mod migrate;
pub mod sell;
pub mod update_protocol;

pub use buy::*;
pub use create::*;
pub use initialize::*;
pub use migrate::*;
pub use sell::*;
pub use update_protocol::*;
