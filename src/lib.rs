//! Dataserve SDK: configuration-driven data access over namespace rows.

pub mod binding;
pub mod case;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod hooks;
pub mod ident;
pub mod record;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use binding::{BindingRegistry, TableBinding};
pub use config::{load_registry, EntityDescriptor, NamespaceConfig, NamespaceRegistry};
pub use context::RequestContext;
pub use error::{ConfigError, DataError};
pub use executor::{Dialect, MySqlExecutor, StatementExecutor};
pub use hooks::LifecycleHooks;
pub use ident::{IdAllocator, IdStrategy};
pub use record::Record;
pub use routes::{app_router, common_routes, common_routes_with_state, entity_routes};
pub use service::{DataService, DataServiceBuilder};
pub use sql::Page;
pub use state::AppState;
pub use store::{ensure_config_table, replace_config_rows};
