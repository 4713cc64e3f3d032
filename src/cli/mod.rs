pub mod info;
pub mod process;
pub mod resolve;
pub mod search;
