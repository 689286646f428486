pub mod base64;
pub mod detect;
pub mod list;
pub mod transcode;
pub mod validate;
