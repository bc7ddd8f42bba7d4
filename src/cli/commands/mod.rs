mod check;
mod init;

pub use check::cmd_check;
pub use init::cmd_init;
