//! Permission gate implementations

pub mod permissions;

pub use permissions::RolePermissionGate;
