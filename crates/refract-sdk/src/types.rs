//! Type handles and the built-in type universe
//!
//! A [`TypeHandle`] is a cheap, clonable reference to an immutable loaded
//! type. Handles compare by name, which is unique within one runtime.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The eight primitive kinds and their wrapper types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// 32-bit integer (`Integer`)
    Int,
    /// 64-bit integer (`Long`)
    Long,
    /// UTF-16 code unit (`Character`)
    Char,
    /// 32-bit float (`Float`)
    Float,
    /// 64-bit float (`Double`)
    Double,
    /// Boolean (`Boolean`)
    Boolean,
    /// 8-bit integer (`Byte`)
    Byte,
    /// 16-bit integer (`Short`)
    Short,
}

impl PrimitiveKind {
    /// All primitive kinds, in table order
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Char,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
    ];

    /// Primitive type name
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
        }
    }

    /// Name of the wrapper type
    pub const fn wrapper_name(self) -> &'static str {
        match self {
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
        }
    }

    /// Whether the wrapper extends `Number`
    pub const fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Char | PrimitiveKind::Boolean)
    }

    /// Look up a kind by primitive name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Look up a kind by wrapper name
    pub fn from_wrapper_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.wrapper_name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// What sort of type a handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// The `void` pseudo-type
    Void,
    /// A primitive type
    Primitive(PrimitiveKind),
    /// A class
    Class,
    /// An interface
    Interface,
    /// An annotation type
    Annotation,
}

struct TypeData {
    name: String,
    kind: TypeKind,
    superclass: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
}

/// Reference to a loaded type
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeData>);

impl TypeHandle {
    /// Create a handle. Callers are responsible for name uniqueness.
    pub fn new(
        name: impl Into<String>,
        kind: TypeKind,
        superclass: Option<TypeHandle>,
        interfaces: Vec<TypeHandle>,
    ) -> Self {
        TypeHandle(Arc::new(TypeData {
            name: name.into(),
            kind,
            superclass,
            interfaces,
        }))
    }

    /// Fully qualified name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Name without its package prefix
    pub fn simple_name(&self) -> &str {
        let name = self.name();
        name.rsplit(['.', '$']).next().unwrap_or(name)
    }

    /// Package prefix, empty for unqualified names
    pub fn package(&self) -> &str {
        self.name().rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }

    /// Kind of type
    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    /// Direct superclass, `None` for the root, interfaces and primitives
    pub fn superclass(&self) -> Option<&TypeHandle> {
        self.0.superclass.as_ref()
    }

    /// Directly implemented (or extended, for interfaces) interfaces
    pub fn interfaces(&self) -> &[TypeHandle] {
        &self.0.interfaces
    }

    /// Primitive kind, if this is a primitive type
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.0.kind {
            TypeKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Whether this is a primitive type
    pub fn is_primitive(&self) -> bool {
        self.primitive_kind().is_some()
    }

    /// Whether this is `void`
    pub fn is_void(&self) -> bool {
        self.0.kind == TypeKind::Void
    }

    /// Whether values of this type are object references
    pub fn is_reference(&self) -> bool {
        matches!(
            self.0.kind,
            TypeKind::Class | TypeKind::Interface | TypeKind::Annotation
        )
    }

    /// Iterate self, then each superclass up to the root
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    /// Whether this type is `other` or one of its supertypes
    ///
    /// Primitive types are only assignable from themselves; boxing is the
    /// matcher's concern.
    pub fn is_assignable_from(&self, other: &TypeHandle) -> bool {
        if self == other {
            return true;
        }
        if !self.is_reference() || !other.is_reference() {
            return false;
        }
        if *self == builtin::object() {
            return true;
        }
        other
            .ancestors()
            .any(|ty| ty == *self || ty.implements(self))
    }

    fn implements(&self, target: &TypeHandle) -> bool {
        self.interfaces()
            .iter()
            .any(|iface| iface == target || iface.implements(target))
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.name())
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Iterator over a type and its superclass chain
pub struct Ancestors {
    next: Option<TypeHandle>,
}

impl Iterator for Ancestors {
    type Item = TypeHandle;

    fn next(&mut self) -> Option<TypeHandle> {
        let current = self.next.take()?;
        self.next = current.superclass().cloned();
        Some(current)
    }
}

/// Built-in types shared by every runtime
///
/// These handles exist without any runtime so that boxing and assignability
/// can be computed on bare handles.
pub mod builtin {
    use once_cell::sync::Lazy;

    use super::{PrimitiveKind, TypeHandle, TypeKind};

    /// Name of the root type
    pub const OBJECT: &str = "Object";
    /// Name of the numeric wrapper base type
    pub const NUMBER: &str = "Number";
    /// Name of the string type
    pub const STRING: &str = "String";
    /// Name of the void pseudo-type
    pub const VOID: &str = "void";

    struct Universe {
        object: TypeHandle,
        number: TypeHandle,
        string: TypeHandle,
        void: TypeHandle,
        primitives: Vec<TypeHandle>,
        wrappers: Vec<TypeHandle>,
    }

    static UNIVERSE: Lazy<Universe> = Lazy::new(|| {
        let object = TypeHandle::new(OBJECT, TypeKind::Class, None, Vec::new());
        let number = TypeHandle::new(NUMBER, TypeKind::Class, Some(object.clone()), Vec::new());
        let string = TypeHandle::new(STRING, TypeKind::Class, Some(object.clone()), Vec::new());
        let void = TypeHandle::new(VOID, TypeKind::Void, None, Vec::new());

        let primitives = PrimitiveKind::ALL
            .iter()
            .map(|&k| TypeHandle::new(k.name(), TypeKind::Primitive(k), None, Vec::new()))
            .collect();
        let wrappers = PrimitiveKind::ALL
            .iter()
            .map(|&k| {
                let parent = if k.is_numeric() { &number } else { &object };
                TypeHandle::new(k.wrapper_name(), TypeKind::Class, Some(parent.clone()), Vec::new())
            })
            .collect();

        Universe {
            object,
            number,
            string,
            void,
            primitives,
            wrappers,
        }
    });

    /// The root type
    pub fn object() -> TypeHandle {
        UNIVERSE.object.clone()
    }

    /// Base type of the numeric wrappers
    pub fn number() -> TypeHandle {
        UNIVERSE.number.clone()
    }

    /// The string type
    pub fn string() -> TypeHandle {
        UNIVERSE.string.clone()
    }

    /// The void pseudo-type
    pub fn void() -> TypeHandle {
        UNIVERSE.void.clone()
    }

    /// Primitive type for a kind
    pub fn primitive(kind: PrimitiveKind) -> TypeHandle {
        UNIVERSE.primitives[kind.index()].clone()
    }

    /// Wrapper type for a kind
    pub fn wrapper(kind: PrimitiveKind) -> TypeHandle {
        UNIVERSE.wrappers[kind.index()].clone()
    }

    /// Every built-in handle, supertypes before subtypes
    pub fn all() -> Vec<TypeHandle> {
        let mut all = vec![object(), number(), string(), void()];
        all.extend(UNIVERSE.primitives.iter().cloned());
        all.extend(UNIVERSE.wrappers.iter().cloned());
        all
    }
}
