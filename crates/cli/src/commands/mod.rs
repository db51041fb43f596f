pub mod chat;
pub mod onboard;
pub mod run;
pub mod session;
pub mod tools;
