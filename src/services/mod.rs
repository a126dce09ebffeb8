pub mod catalog;
pub mod episodes;
pub mod identity;
pub mod likes;
pub mod watch;
