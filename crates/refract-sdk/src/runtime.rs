//! Collaborator traits a host runtime implements
//!
//! The engine never inspects a runtime's internals; it resolves types through
//! a [`TypeLoader`] and enumerates, reads, writes, and invokes members through
//! a [`ReflectRuntime`].

use crate::error::SdkResult;
use crate::member::{ConstructorRef, FieldRef, MethodRef};
use crate::types::TypeHandle;
use crate::value::{ObjectRef, Value};

/// Resolves type names to handles
pub trait TypeLoader: Send + Sync {
    /// Primary strategy: locate a type, running its static initialization
    /// when `initialize` is true
    fn find_type(&self, name: &str, initialize: bool) -> SdkResult<TypeHandle>;

    /// Secondary strategy: load a type without initializing it
    fn load_type(&self, name: &str) -> SdkResult<TypeHandle>;
}

/// Member metadata and access primitives of a host runtime
///
/// Primitives honour the member's `accessible` flag: a non-public member that
/// has not been made accessible is refused with `AccessViolation`.
pub trait ReflectRuntime: Send + Sync {
    /// Fields declared directly by `ty`, in declaration order
    fn declared_fields(&self, ty: &TypeHandle) -> Vec<FieldRef>;

    /// Methods declared directly by `ty`, in declaration order
    fn declared_methods(&self, ty: &TypeHandle) -> Vec<MethodRef>;

    /// Constructors declared directly by `ty`, in declaration order
    fn declared_constructors(&self, ty: &TypeHandle) -> Vec<ConstructorRef>;

    /// Next type in the ancestor chain
    fn superclass_of(&self, ty: &TypeHandle) -> Option<TypeHandle> {
        ty.superclass().cloned()
    }

    /// Read a field; `instance` is `None` for static fields
    fn get(&self, field: &FieldRef, instance: Option<&ObjectRef>) -> SdkResult<Value>;

    /// Write a field; `instance` is `None` for static fields
    fn set(&self, field: &FieldRef, instance: Option<&ObjectRef>, value: Value) -> SdkResult<()>;

    /// Invoke a method; `instance` is `None` for static methods
    fn invoke(&self, method: &MethodRef, instance: Option<&ObjectRef>, args: &[Value]) -> SdkResult<Value>;

    /// Allocate and initialize a new instance
    fn construct(&self, ctor: &ConstructorRef, args: &[Value]) -> SdkResult<ObjectRef>;

    /// Runtime type of a value; `None` for null
    fn runtime_type_of(&self, value: &Value) -> Option<TypeHandle> {
        value.runtime_type()
    }
}
