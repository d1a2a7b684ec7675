pub(crate) mod constants;
pub mod sglang;

pub use sglang::{SGLangConfig, SGLangModel};
