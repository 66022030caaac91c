pub mod deploy;
pub mod init;
pub mod package;
pub mod validate;
