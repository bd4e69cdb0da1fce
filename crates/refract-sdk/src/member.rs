//! Field, method, and constructor descriptors
//!
//! Descriptors are `Arc`-backed so the engine can hand out clones freely.
//! Two descriptors are equal when they identify the same declaration:
//! declaring type and name for fields, plus parameter types for methods,
//! declaring type and parameter types for constructors.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::{SdkError, SdkResult};
use crate::modifiers::Modifiers;
use crate::runtime::ReflectRuntime;
use crate::types::TypeHandle;

/// Which kind of member a descriptor describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// A field
    Field,
    /// A method
    Method,
    /// A constructor
    Constructor,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Field => "field",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
        })
    }
}

/// Behaviour shared by every member descriptor
pub trait Member: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// Kind of member
    const KIND: MemberKind;

    /// Member name; a constructor reports its declaring type's name
    fn name(&self) -> &str;

    /// Type that declares this member
    fn declaring_type(&self) -> &TypeHandle;

    /// Current modifier set
    fn modifiers(&self) -> Modifiers;

    /// Attached annotation types
    fn annotations(&self) -> &[TypeHandle];

    /// Whether an annotation of the given type is attached
    fn has_annotation(&self, annotation: &TypeHandle) -> bool {
        self.annotations().iter().any(|a| a == annotation)
    }

    /// Whether visibility checks are bypassed for this member
    fn is_accessible(&self) -> bool;

    /// Enable or disable the visibility bypass
    fn set_accessible(&self, accessible: bool);

    /// Members of this kind declared directly by `ty`
    fn declared_in(runtime: &dyn ReflectRuntime, ty: &TypeHandle) -> Vec<Self>;
}

/// Members that take parameters
pub trait Callable: Member {
    /// Declared parameter types, in order
    fn parameter_types(&self) -> &[TypeHandle];
}

fn check_visibility(modifiers: Modifiers, what: impl FnOnce() -> String) -> SdkResult<()> {
    if modifiers.has_valid_visibility() {
        Ok(())
    } else {
        Err(SdkError::InvalidDefinition(format!(
            "{} has conflicting visibility modifiers ({})",
            what(),
            modifiers
        )))
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[TypeHandle]) -> fmt::Result {
    f.write_str("(")?;
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        f.write_str(param.name())?;
    }
    f.write_str(")")
}

fn write_modifiers(f: &mut fmt::Formatter<'_>, modifiers: Modifiers) -> fmt::Result {
    if modifiers.is_empty() {
        Ok(())
    } else {
        write!(f, "{} ", modifiers)
    }
}

// ============================================================================
// Fields
// ============================================================================

struct FieldData {
    name: String,
    declaring: TypeHandle,
    ty: TypeHandle,
    modifiers: AtomicU32,
    annotations: Vec<TypeHandle>,
    accessible: AtomicBool,
}

/// Field descriptor
///
/// The modifier set is interior-mutable so the final bit can be suspended
/// during a forced static write.
#[derive(Clone)]
pub struct FieldRef(Arc<FieldData>);

impl FieldRef {
    /// Create a field descriptor
    pub fn new(
        name: impl Into<String>,
        declaring: TypeHandle,
        ty: TypeHandle,
        modifiers: Modifiers,
        annotations: Vec<TypeHandle>,
    ) -> SdkResult<Self> {
        let name = name.into();
        check_visibility(modifiers, || format!("field {}.{}", declaring.name(), name))?;
        Ok(FieldRef(Arc::new(FieldData {
            name,
            declaring,
            ty,
            modifiers: AtomicU32::new(modifiers.bits()),
            annotations,
            accessible: AtomicBool::new(false),
        })))
    }

    /// Declared value type
    pub fn field_type(&self) -> &TypeHandle {
        &self.0.ty
    }

    /// Replace the modifier set in place; visible through every clone
    pub fn set_modifiers(&self, modifiers: Modifiers) {
        self.0.modifiers.store(modifiers.bits(), Ordering::SeqCst);
    }
}

impl Member for FieldRef {
    const KIND: MemberKind = MemberKind::Field;

    fn name(&self) -> &str {
        &self.0.name
    }

    fn declaring_type(&self) -> &TypeHandle {
        &self.0.declaring
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers::from_bits_retain(self.0.modifiers.load(Ordering::SeqCst))
    }

    fn annotations(&self) -> &[TypeHandle] {
        &self.0.annotations
    }

    fn is_accessible(&self) -> bool {
        self.0.accessible.load(Ordering::Relaxed)
    }

    fn set_accessible(&self, accessible: bool) {
        self.0.accessible.store(accessible, Ordering::Relaxed);
    }

    fn declared_in(runtime: &dyn ReflectRuntime, ty: &TypeHandle) -> Vec<Self> {
        runtime.declared_fields(ty)
    }
}

impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.declaring == other.0.declaring && self.0.name == other.0.name)
    }
}

impl Eq for FieldRef {}

impl Hash for FieldRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.declaring.hash(state);
        self.0.name.hash(state);
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_modifiers(f, self.modifiers())?;
        write!(f, "{} {}.{}", self.0.ty.name(), self.0.declaring.name(), self.0.name)
    }
}

impl fmt::Debug for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldRef({})", self)
    }
}

// ============================================================================
// Methods
// ============================================================================

struct MethodData {
    name: String,
    declaring: TypeHandle,
    params: Vec<TypeHandle>,
    return_type: TypeHandle,
    modifiers: Modifiers,
    annotations: Vec<TypeHandle>,
    accessible: AtomicBool,
}

/// Method descriptor
#[derive(Clone)]
pub struct MethodRef(Arc<MethodData>);

impl MethodRef {
    /// Create a method descriptor
    pub fn new(
        name: impl Into<String>,
        declaring: TypeHandle,
        params: Vec<TypeHandle>,
        return_type: TypeHandle,
        modifiers: Modifiers,
        annotations: Vec<TypeHandle>,
    ) -> SdkResult<Self> {
        let name = name.into();
        check_visibility(modifiers, || format!("method {}.{}", declaring.name(), name))?;
        Ok(MethodRef(Arc::new(MethodData {
            name,
            declaring,
            params,
            return_type,
            modifiers,
            annotations,
            accessible: AtomicBool::new(false),
        })))
    }

    /// Declared return type
    pub fn return_type(&self) -> &TypeHandle {
        &self.0.return_type
    }
}

impl Member for MethodRef {
    const KIND: MemberKind = MemberKind::Method;

    fn name(&self) -> &str {
        &self.0.name
    }

    fn declaring_type(&self) -> &TypeHandle {
        &self.0.declaring
    }

    fn modifiers(&self) -> Modifiers {
        self.0.modifiers
    }

    fn annotations(&self) -> &[TypeHandle] {
        &self.0.annotations
    }

    fn is_accessible(&self) -> bool {
        self.0.accessible.load(Ordering::Relaxed)
    }

    fn set_accessible(&self, accessible: bool) {
        self.0.accessible.store(accessible, Ordering::Relaxed);
    }

    fn declared_in(runtime: &dyn ReflectRuntime, ty: &TypeHandle) -> Vec<Self> {
        runtime.declared_methods(ty)
    }
}

impl Callable for MethodRef {
    fn parameter_types(&self) -> &[TypeHandle] {
        &self.0.params
    }
}

impl PartialEq for MethodRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.declaring == other.0.declaring
                && self.0.name == other.0.name
                && self.0.params == other.0.params)
    }
}

impl Eq for MethodRef {}

impl Hash for MethodRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.declaring.hash(state);
        self.0.name.hash(state);
        self.0.params.hash(state);
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_modifiers(f, self.0.modifiers)?;
        write!(
            f,
            "{} {}.{}",
            self.0.return_type.name(),
            self.0.declaring.name(),
            self.0.name
        )?;
        write_params(f, &self.0.params)
    }
}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodRef({})", self)
    }
}

// ============================================================================
// Constructors
// ============================================================================

struct ConstructorData {
    declaring: TypeHandle,
    params: Vec<TypeHandle>,
    modifiers: Modifiers,
    annotations: Vec<TypeHandle>,
    accessible: AtomicBool,
}

/// Constructor descriptor
#[derive(Clone)]
pub struct ConstructorRef(Arc<ConstructorData>);

impl ConstructorRef {
    /// Create a constructor descriptor
    pub fn new(
        declaring: TypeHandle,
        params: Vec<TypeHandle>,
        modifiers: Modifiers,
        annotations: Vec<TypeHandle>,
    ) -> SdkResult<Self> {
        check_visibility(modifiers, || format!("constructor of {}", declaring.name()))?;
        Ok(ConstructorRef(Arc::new(ConstructorData {
            declaring,
            params,
            modifiers,
            annotations,
            accessible: AtomicBool::new(false),
        })))
    }
}

impl Member for ConstructorRef {
    const KIND: MemberKind = MemberKind::Constructor;

    fn name(&self) -> &str {
        self.0.declaring.name()
    }

    fn declaring_type(&self) -> &TypeHandle {
        &self.0.declaring
    }

    fn modifiers(&self) -> Modifiers {
        self.0.modifiers
    }

    fn annotations(&self) -> &[TypeHandle] {
        &self.0.annotations
    }

    fn is_accessible(&self) -> bool {
        self.0.accessible.load(Ordering::Relaxed)
    }

    fn set_accessible(&self, accessible: bool) {
        self.0.accessible.store(accessible, Ordering::Relaxed);
    }

    fn declared_in(runtime: &dyn ReflectRuntime, ty: &TypeHandle) -> Vec<Self> {
        runtime.declared_constructors(ty)
    }
}

impl Callable for ConstructorRef {
    fn parameter_types(&self) -> &[TypeHandle] {
        &self.0.params
    }
}

impl PartialEq for ConstructorRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.declaring == other.0.declaring && self.0.params == other.0.params)
    }
}

impl Eq for ConstructorRef {}

impl Hash for ConstructorRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.declaring.hash(state);
        self.0.params.hash(state);
    }
}

impl fmt::Display for ConstructorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_modifiers(f, self.0.modifiers)?;
        f.write_str(self.0.declaring.name())?;
        write_params(f, &self.0.params)
    }
}

impl fmt::Debug for ConstructorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstructorRef({})", self)
    }
}
