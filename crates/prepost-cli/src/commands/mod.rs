pub mod assign;
pub mod init;
pub mod inspect;
pub mod validate;
