pub mod common;

pub use common::MessageUtils;
