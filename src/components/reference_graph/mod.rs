mod checklist;
mod component;
mod config;
mod interaction;
mod layout;
mod membership;
mod render;
pub mod scale;
mod source;
mod types;

pub use component::ReferenceGraph;
pub use config::GraphConfig;
