pub mod ci;
pub mod publish;
pub mod setup;
pub mod tasks;
