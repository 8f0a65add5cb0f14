pub mod badge_font;
pub mod config;
pub mod contract;
pub mod core_service;
pub mod favicon;
pub mod host;
pub mod icon_coordinator;
pub mod icon_disk_cache;
pub mod icon_key;
pub mod icon_memory_cache;
pub mod icon_resolver;
pub mod launcher;
pub mod logging;
pub mod model;
pub mod runtime;
pub mod target_store;
pub mod text_icon;
pub mod transport;
