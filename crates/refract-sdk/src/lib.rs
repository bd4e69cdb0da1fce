//! Refract SDK - object model shared by the reflection engine and runtimes
//!
//! This crate provides the minimal types and traits a host runtime needs to
//! expose its metadata to the Refract engine without depending on it:
//!
//! - [`TypeHandle`]: loaded type with its ancestor chain
//! - [`FieldRef`], [`MethodRef`], [`ConstructorRef`]: member descriptors
//! - [`Value`] and [`ObjectRef`]: runtime values and instances
//! - [`TypeLoader`] and [`ReflectRuntime`]: the collaborator traits the engine
//!   drives (type resolution, member enumeration, get/set/invoke/construct)
//!
//! # Example
//!
//! ```ignore
//! use refract_sdk::{builtin, PrimitiveKind, Value};
//!
//! let boxed = Value::Int(42).runtime_type().unwrap();
//! assert_eq!(boxed, builtin::wrapper(PrimitiveKind::Int));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod member;
pub mod modifiers;
pub mod runtime;
pub mod types;
pub mod value;

pub use error::{SdkError, SdkResult};
pub use member::{Callable, ConstructorRef, FieldRef, Member, MemberKind, MethodRef};
pub use modifiers::{Modifiers, TraitState, VisibilityMask};
pub use runtime::{ReflectRuntime, TypeLoader};
pub use types::{builtin, Ancestors, PrimitiveKind, TypeHandle, TypeKind};
pub use value::{Instance, ObjectRef, Value};
