pub mod codec;
pub mod meta;
pub mod normalize;
pub mod text;
pub mod validate;

pub use codec::DecodeError;
pub use meta::SshMeta;
pub use validate::{PolicyError, TokenizeError};
