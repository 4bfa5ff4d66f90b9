// For integration tests only, the server ships as a binary
pub mod cli;
pub mod config;
pub mod logging;
pub mod prompts;
pub mod protocol;
pub mod reference;
pub mod server;
pub mod tools;
