// ANPR Migration Badge - Core Library
// Exposes all modules for use in the CLI, the HTTP server, and tests

pub mod api;           // HTTP routing + response shaping
pub mod badge;         // SVG renderer + palette + icons
pub mod config;        // Environment configuration
pub mod error;         // Error taxonomy + problem payload
pub mod observability; // tracing subscriber
pub mod registry;      // ANPR registry client
pub mod service;       // fetch → resolve → render
pub mod status;        // Status resolver
pub mod validation;    // Identifier + parameter whitelist

// Re-export commonly used types
pub use api::{build_router, AppState};
pub use badge::{
    BadgeColor, BadgeImage, BadgeRenderer, BadgeSpec, StatusIcon, SvgBadgeRenderer,
    SVG_MEDIA_TYPE,
};
pub use config::BadgeConfig;
pub use error::{BadgeError, Problem};
pub use registry::{HttpRegistryClient, RawRegistryRecord, RegistryClient};
pub use service::BadgeService;
pub use status::{resolve, LifecycleState, Milestone, ResolvedStatus};
pub use validation::EntityIdentifier;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
