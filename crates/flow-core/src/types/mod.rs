//! 공통 타입 정의.

pub mod flow;
pub mod market;
pub mod stock;

pub use flow::*;
pub use market::*;
pub use stock::*;
