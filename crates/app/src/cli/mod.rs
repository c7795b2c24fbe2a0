pub mod args;
pub mod input;
pub mod op;
pub mod ops;

pub use ops::{Decrypt, Encrypt, Init, Verify, Version};
