// # caddy-gen-core
//
// Core library for generating Caddy configuration from container labels.
//
// ## Architecture Overview
//
// - **ContainerInventory**: Trait for listing containers and watching lifecycle events
// - **Notifier**: Trait for the post-write reload action
// - **OutputStore**: Trait for reading and replacing the generated configuration
// - **binding**: Label grammar, one container label to many bindings
// - **render**: Grouping of bindings by host and Caddyfile rendering
// - **GenEngine**: Core engine that orchestrates event → debounce → regenerate → notify
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Parsing and rendering are pure; I/O sits behind traits
// 2. **Event-Driven**: Lifecycle events arrive as an async stream
// 3. **Change Detection**: The previously written file is the only state
// 4. **Library-First**: All core functionality can be used as a library

pub mod binding;
pub mod config;
pub mod engine;
pub mod error;
pub mod render;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use binding::{BindingSpec, parse_bindings};
pub use config::{EngineConfig, GenConfig, NotifyConfig, RuntimeConnectionConfig};
pub use engine::{EngineEvent, GenEngine, ReconcileOutcome};
pub use error::{BindingError, Error, Result};
pub use render::{Renderer, RouteGroup, group_routes};
pub use state::{FileOutputStore, MemoryOutputStore};
pub use traits::{ContainerInventory, Notifier, OutputStore};
