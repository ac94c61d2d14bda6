pub mod channel;
pub mod command;
pub mod frame;
pub mod rendezvous;
