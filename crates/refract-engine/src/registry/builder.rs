//! Type definitions for the registry
//!
//! Definitions name types by string; names are resolved when the class is
//! defined, so every referenced type must already exist in the registry.

use std::sync::Arc;

use refract_sdk::{builtin, Modifiers, ObjectRef, TypeHandle, TypeKind, Value};

use super::ClassRegistry;

/// Method implementation: receiver (`None` for statics) and coerced arguments
pub type MethodBody = Arc<dyn Fn(Option<&ObjectRef>, &[Value]) -> Result<Value, String> + Send + Sync>;

/// Constructor implementation: initializes a freshly allocated instance
pub type ConstructorBody = Arc<dyn Fn(&ObjectRef, &[Value]) -> Result<(), String> + Send + Sync>;

/// Static initializer, run once on the first initializing lookup
pub type StaticInit = Arc<dyn Fn(&ClassRegistry, &TypeHandle) -> Result<(), String> + Send + Sync>;

/// Modifier setters shared by every definition kind
macro_rules! modifier_setters {
    () => {
        /// Replace the modifier set
        pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
            self.modifiers = modifiers;
            self
        }

        /// Mark as public
        pub fn public(mut self) -> Self {
            self.modifiers |= Modifiers::PUBLIC;
            self
        }

        /// Mark as protected
        pub fn protected(mut self) -> Self {
            self.modifiers |= Modifiers::PROTECTED;
            self
        }

        /// Mark as private
        pub fn private(mut self) -> Self {
            self.modifiers |= Modifiers::PRIVATE;
            self
        }

        /// Attach an annotation by type name
        pub fn annotated(mut self, annotation: &str) -> Self {
            self.annotations.push(annotation.to_string());
            self
        }
    };
}

/// Definition for a field
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Value type name
    pub type_name: String,
    /// Modifier set
    pub modifiers: Modifiers,
    /// Annotation type names
    pub annotations: Vec<String>,
    /// Initial value (if any); otherwise the type's zero value
    pub initial_value: Option<Value>,
}

impl FieldDef {
    /// Create a package-visible instance field
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            initial_value: None,
        }
    }

    modifier_setters!();

    /// Mark as static field
    pub fn as_static(mut self) -> Self {
        self.modifiers |= Modifiers::STATIC;
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.modifiers |= Modifiers::FINAL;
        self
    }

    /// Mark as transient
    pub fn as_transient(mut self) -> Self {
        self.modifiers |= Modifiers::TRANSIENT;
        self
    }

    /// Mark as volatile
    pub fn as_volatile(mut self) -> Self {
        self.modifiers |= Modifiers::VOLATILE;
        self
    }

    /// Set the initial value
    pub fn initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }
}

/// Definition for a method
#[derive(Clone)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Parameter type names
    pub params: Vec<String>,
    /// Return type name
    pub return_type: String,
    /// Modifier set
    pub modifiers: Modifiers,
    /// Annotation type names
    pub annotations: Vec<String>,
    /// Implementation; abstract and native methods may have none
    pub body: Option<MethodBody>,
}

impl MethodDef {
    /// Create a package-visible `void` method with no parameters
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            return_type: builtin::VOID.to_string(),
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            body: None,
        }
    }

    modifier_setters!();

    /// Add a parameter
    pub fn with_param(mut self, type_name: &str) -> Self {
        self.params.push(type_name.to_string());
        self
    }

    /// Set return type
    pub fn returns(mut self, type_name: &str) -> Self {
        self.return_type = type_name.to_string();
        self
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.modifiers |= Modifiers::STATIC;
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.modifiers |= Modifiers::FINAL;
        self
    }

    /// Mark as abstract
    pub fn as_abstract(mut self) -> Self {
        self.modifiers |= Modifiers::ABSTRACT;
        self
    }

    /// Mark as native
    pub fn as_native(mut self) -> Self {
        self.modifiers |= Modifiers::NATIVE;
        self
    }

    /// Mark as synchronized
    pub fn as_synchronized(mut self) -> Self {
        self.modifiers |= Modifiers::SYNCHRONIZED;
        self
    }

    /// Mark as strictfp
    pub fn as_strict(mut self) -> Self {
        self.modifiers |= Modifiers::STRICT;
        self
    }

    /// Set the implementation
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(Option<&ObjectRef>, &[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }
}

/// Definition for a constructor
#[derive(Clone)]
pub struct ConstructorDef {
    /// Parameter type names
    pub params: Vec<String>,
    /// Modifier set
    pub modifiers: Modifiers,
    /// Annotation type names
    pub annotations: Vec<String>,
    /// Initializer run after field defaults are applied
    pub body: Option<ConstructorBody>,
}

impl ConstructorDef {
    /// Create a package-visible no-arg constructor
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            body: None,
        }
    }

    modifier_setters!();

    /// Add a parameter
    pub fn with_param(mut self, type_name: &str) -> Self {
        self.params.push(type_name.to_string());
        self
    }

    /// Set the initializer
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> Result<(), String> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }
}

impl Default for ConstructorDef {
    fn default() -> Self {
        Self::new()
    }
}

/// Definition of a class, interface, or annotation type
#[derive(Clone)]
pub struct ClassBuilder {
    /// Fully qualified name
    pub name: String,
    /// Kind of type
    pub kind: TypeKind,
    /// Superclass name; `None` means the root type for classes
    pub superclass: Option<String>,
    /// Implemented interface names
    pub interfaces: Vec<String>,
    /// Declared fields
    pub fields: Vec<FieldDef>,
    /// Declared methods
    pub methods: Vec<MethodDef>,
    /// Declared constructors
    pub constructors: Vec<ConstructorDef>,
    /// Static initializer
    pub static_init: Option<StaticInit>,
}

impl ClassBuilder {
    /// Start a class definition
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Class,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            static_init: None,
        }
    }

    /// Start an interface definition
    pub fn interface(name: &str) -> Self {
        Self {
            kind: TypeKind::Interface,
            ..Self::new(name)
        }
    }

    /// Start an annotation type definition
    pub fn annotation(name: &str) -> Self {
        Self {
            kind: TypeKind::Annotation,
            ..Self::new(name)
        }
    }

    /// Set the superclass
    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    /// Add an implemented (or, for interfaces, extended) interface
    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    /// Add a field
    pub fn add_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a method
    pub fn add_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a constructor
    pub fn add_constructor(mut self, constructor: ConstructorDef) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Set the static initializer
    pub fn static_init<F>(mut self, init: F) -> Self
    where
        F: Fn(&ClassRegistry, &TypeHandle) -> Result<(), String> + Send + Sync + 'static,
    {
        self.static_init = Some(Arc::new(init));
        self
    }
}
