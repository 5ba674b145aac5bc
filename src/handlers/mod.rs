//! HTTP handlers for namespace CRUD and configuration admin.

pub mod admin;
pub mod entity;
