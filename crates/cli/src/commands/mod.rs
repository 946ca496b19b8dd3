pub mod chat;
pub mod onboard;
pub mod pantry;
pub mod status;
