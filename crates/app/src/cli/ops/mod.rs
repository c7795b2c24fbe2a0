pub mod decrypt;
pub mod encrypt;
pub mod init;
pub mod verify;
pub mod version;

pub use decrypt::Decrypt;
pub use encrypt::Encrypt;
pub use init::Init;
pub use verify::Verify;
pub use version::Version;
