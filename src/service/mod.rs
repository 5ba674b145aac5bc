//! Namespace CRUD: per-operation templates and the shared service facade.

mod crud;
mod facade;
pub use crud::CrudTemplate;
pub use facade::{DataService, DataServiceBuilder};
