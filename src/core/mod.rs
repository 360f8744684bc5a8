pub mod accessor;
pub mod error;
pub mod transport;
pub mod verify;
