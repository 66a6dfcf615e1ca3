pub mod chat;
pub mod cliente;
pub mod produto;
pub mod remote;
pub mod transfer;
