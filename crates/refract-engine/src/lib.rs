//! Refract Reflection Engine
//!
//! Filter-driven member lookup and invocation over a pluggable runtime:
//! - **Filters**: composable, reusable predicates over fields, methods, and
//!   constructors (`filter` module)
//! - **Finder**: member enumeration over a type and its ancestors (`finder`)
//! - **Matcher**: argument compatibility with primitive/wrapper boxing (`matcher`)
//! - **Dispatch**: resolve-then-act calls and field access (`dispatch`)
//! - **Registry**: an in-memory runtime and loader (`registry`)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use refract_engine::{ClassBuilder, ClassRegistry, ConstructorFilter, FieldDef, FieldFilter, Reflector};
//! use refract_sdk::Value;
//!
//! let registry = Arc::new(ClassRegistry::new());
//! let point = registry.define(
//!     ClassBuilder::new("geo.Point").add_field(FieldDef::new("x", "double").private()),
//! )?;
//!
//! let reflector = Reflector::for_registry(registry);
//! let obj = reflector.call_constructor(&point, &ConstructorFilter::new(), &[])?;
//! reflector.write_field(&obj, true, &FieldFilter::new().named("x"), Value::Double(1.5))?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Filter-driven dispatch
pub mod dispatch;

/// Member filters and composition
pub mod filter;

/// Member enumeration
pub mod finder;

/// Type loading
pub mod loader;

/// Argument compatibility
pub mod matcher;

/// In-memory runtime
pub mod registry;

// ============================================================================
// Support Modules
// ============================================================================

/// TOML configuration
pub mod config;

/// Error types
pub mod error;

/// Tracing setup
pub mod logging;

/// Reflection permissions
pub mod permissions;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::ReflectConfig;
pub use dispatch::Reflector;
pub use error::{ReflectError, ReflectResult};
pub use filter::{And, ConstructorFilter, FieldFilter, Filter, FilterExt, MethodFilter, NamePattern};
pub use loader::{default_loader, install_default_loader, load_type, load_type_in, LoaderContext};
pub use permissions::{PackagePermissionRule, PermissionStore, ReflectionPermission};
pub use registry::{ClassBuilder, ClassRegistry, ConstructorDef, FieldDef, MethodDef};
