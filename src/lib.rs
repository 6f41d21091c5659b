pub mod carousel;
pub mod config;
pub mod error;
pub mod events;
pub mod layout;
pub mod probe;
pub mod resolve;
pub mod session;
pub mod theme;
pub mod tasks {
    pub mod render;
    pub mod scanner;
    pub mod view;
}
