pub mod eval;
pub mod init;
pub mod measures;
