//! In-memory runtime backed by registered type definitions
//!
//! [`ClassRegistry`] implements both [`TypeLoader`] and [`ReflectRuntime`].
//! It starts with the built-in universe (`void`, the primitives and their
//! wrappers, `Object`, `Number`, `String`) and grows through
//! [`ClassRegistry::define`].
//!
//! Member descriptors handed out by the registry are shared: every lookup
//! of a member returns a clone of the same descriptor, so accessibility and
//! modifier changes are visible to all holders.

mod builder;

pub use builder::{ClassBuilder, ConstructorBody, ConstructorDef, FieldDef, MethodBody, MethodDef, StaticInit};

use std::sync::Arc;

use parking_lot::RwLock;
use refract_sdk::{
    builtin, Callable, ConstructorRef, FieldRef, Member, MethodRef, Modifiers, ObjectRef, ReflectRuntime,
    SdkError, SdkResult, TypeHandle, TypeKind, TypeLoader, Value,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::{ReflectError, ReflectResult};

/// Deferred definition, materialized by the secondary loader strategy
type DeferredDef = Arc<dyn Fn() -> ClassBuilder + Send + Sync>;

/// Static initialization progress of a type
#[derive(Debug, Clone, PartialEq, Eq)]
enum InitState {
    Pending,
    /// The initializer is on the stack; nested accesses proceed
    Running,
    Done,
    /// The initializer failed; every later access reports this message
    Failed(String),
}

struct FieldEntry {
    field: FieldRef,
    initial: Value,
}

struct ClassEntry {
    handle: TypeHandle,
    fields: Vec<FieldEntry>,
    methods: Vec<(MethodRef, Option<MethodBody>)>,
    constructors: Vec<(ConstructorRef, Option<ConstructorBody>)>,
    statics: FxHashMap<String, Value>,
    static_init: Option<StaticInit>,
    init_state: InitState,
}

impl ClassEntry {
    fn bare(handle: TypeHandle) -> Self {
        Self {
            handle,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            statics: FxHashMap::default(),
            static_init: None,
            init_state: InitState::Done,
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    /// Classes indexed by ID
    classes: Vec<ClassEntry>,
    /// Class name to ID mapping
    name_to_id: FxHashMap<String, usize>,
    /// Definitions not yet materialized
    deferred: FxHashMap<String, DeferredDef>,
}

impl RegistryInner {
    fn entry(&self, name: &str) -> Option<&ClassEntry> {
        self.name_to_id.get(name).and_then(|id| self.classes.get(*id))
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut ClassEntry> {
        let id = *self.name_to_id.get(name)?;
        self.classes.get_mut(id)
    }

    fn resolve(&self, name: &str, context: &str) -> ReflectResult<TypeHandle> {
        self.entry(name)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| ReflectError::Registry(format!("{}: unknown type {}", context, name)))
    }

    fn resolve_all(&self, names: &[String], context: &str) -> ReflectResult<Vec<TypeHandle>> {
        names.iter().map(|name| self.resolve(name, context)).collect()
    }

    fn register(&mut self, entry: ClassEntry) -> usize {
        let id = self.classes.len();
        self.name_to_id.insert(entry.handle.name().to_string(), id);
        self.classes.push(entry);
        id
    }
}

/// Type registry and in-memory reflective runtime
pub struct ClassRegistry {
    inner: RwLock<RegistryInner>,
}

impl ClassRegistry {
    /// Create a registry holding the built-in types
    pub fn new() -> Self {
        let mut inner = RegistryInner::default();
        for handle in builtin::all() {
            inner.register(ClassEntry::bare(handle));
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Number of defined types, built-ins included
    pub fn len(&self) -> usize {
        self.inner.read().classes.len()
    }

    /// Always false; the built-in types are always present
    pub fn is_empty(&self) -> bool {
        self.inner.read().classes.is_empty()
    }

    /// Whether `name` is defined (deferred definitions do not count)
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().name_to_id.contains_key(name)
    }

    /// Handle of a defined type, without initialization
    pub fn lookup(&self, name: &str) -> Option<TypeHandle> {
        self.inner.read().entry(name).map(|entry| entry.handle.clone())
    }

    /// Whether the static initializer of `name` has run
    pub fn is_initialized(&self, name: &str) -> bool {
        self.inner
            .read()
            .entry(name)
            .is_some_and(|entry| entry.init_state == InitState::Done)
    }

    // ========================================================================
    // Definition
    // ========================================================================

    /// Define a type
    ///
    /// The superclass (default `Object` for classes), interfaces, and every
    /// referenced member type must already be defined.
    pub fn define(&self, builder: ClassBuilder) -> ReflectResult<TypeHandle> {
        let mut inner = self.inner.write();
        Self::define_locked(&mut inner, builder)
    }

    /// Register a definition that only the secondary loader strategy sees
    pub fn define_deferred<F>(&self, name: &str, definition: F) -> ReflectResult<()>
    where
        F: Fn() -> ClassBuilder + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        if inner.name_to_id.contains_key(name) || inner.deferred.contains_key(name) {
            return Err(ReflectError::Registry(format!("type {} is already defined", name)));
        }
        inner.deferred.insert(name.to_string(), Arc::new(definition));
        Ok(())
    }

    fn define_locked(inner: &mut RegistryInner, builder: ClassBuilder) -> ReflectResult<TypeHandle> {
        let name = builder.name.clone();
        if inner.name_to_id.contains_key(&name) {
            return Err(ReflectError::Registry(format!("type {} is already defined", name)));
        }

        let superclass = match (&builder.superclass, builder.kind) {
            (Some(parent), TypeKind::Class) => {
                let parent = inner.resolve(parent, &name)?;
                if parent.kind() != TypeKind::Class {
                    return Err(ReflectError::Registry(format!(
                        "{}: superclass {} is not a class",
                        name, parent
                    )));
                }
                Some(parent)
            }
            (None, TypeKind::Class) => Some(builtin::object()),
            (Some(_), _) => {
                return Err(ReflectError::Registry(format!(
                    "{}: only classes have a superclass",
                    name
                )))
            }
            (None, _) => None,
        };
        let interfaces = inner.resolve_all(&builder.interfaces, &name)?;
        if let Some(bad) = interfaces.iter().find(|i| i.kind() != TypeKind::Interface) {
            return Err(ReflectError::Registry(format!("{}: {} is not an interface", name, bad)));
        }
        let handle = TypeHandle::new(name.clone(), builder.kind, superclass, interfaces);

        let mut entry = ClassEntry {
            handle: handle.clone(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            statics: FxHashMap::default(),
            static_init: builder.static_init.clone(),
            init_state: if builder.static_init.is_some() {
                InitState::Pending
            } else {
                InitState::Done
            },
        };

        let mut field_names = FxHashSet::default();
        for def in &builder.fields {
            if !field_names.insert(def.name.as_str()) {
                return Err(ReflectError::Registry(format!("{}: duplicate field {}", name, def.name)));
            }
            let ty = inner.resolve(&def.type_name, &name)?;
            let annotations = inner.resolve_all(&def.annotations, &name)?;
            let field = FieldRef::new(&def.name, handle.clone(), ty.clone(), def.modifiers, annotations)?;
            let initial = match &def.initial_value {
                Some(value) => coerce(value, &ty).ok_or_else(|| {
                    ReflectError::Registry(format!("{}: initial value {} does not fit {}", name, value, field))
                })?,
                None => Value::default_for(&ty),
            };
            if def.modifiers.is_static() {
                entry.statics.insert(def.name.clone(), initial.clone());
            }
            entry.fields.push(FieldEntry { field, initial });
        }

        for def in &builder.methods {
            let params = inner.resolve_all(&def.params, &name)?;
            let return_type = inner.resolve(&def.return_type, &name)?;
            let annotations = inner.resolve_all(&def.annotations, &name)?;
            let method = MethodRef::new(&def.name, handle.clone(), params, return_type, def.modifiers, annotations)?;
            if entry.methods.iter().any(|(m, _)| *m == method) {
                return Err(ReflectError::Registry(format!("{}: duplicate method {}", name, method)));
            }
            entry.methods.push((method, def.body.clone()));
        }

        for def in &builder.constructors {
            let params = inner.resolve_all(&def.params, &name)?;
            let annotations = inner.resolve_all(&def.annotations, &name)?;
            let ctor = ConstructorRef::new(handle.clone(), params, def.modifiers, annotations)?;
            if entry.constructors.iter().any(|(c, _)| *c == ctor) {
                return Err(ReflectError::Registry(format!("{}: duplicate constructor {}", name, ctor)));
            }
            entry.constructors.push((ctor, def.body.clone()));
        }
        if builder.constructors.is_empty() && builder.kind == TypeKind::Class {
            let ctor = ConstructorRef::new(handle.clone(), Vec::new(), Modifiers::PUBLIC, Vec::new())?;
            entry.constructors.push((ctor, None));
        }

        inner.register(entry);
        debug!(type_name = %name, kind = ?builder.kind, "defined type");
        Ok(handle)
    }

    // ========================================================================
    // Static state
    // ========================================================================

    /// Assign a static slot directly, bypassing modifiers
    ///
    /// Intended for static initializers.
    pub fn init_static(&self, ty: &TypeHandle, name: &str, value: Value) -> SdkResult<()> {
        let mut inner = self.inner.write();
        let entry = inner
            .entry_mut(ty.name())
            .ok_or_else(|| SdkError::TypeNotFound(ty.name().to_string()))?;
        let field = entry
            .fields
            .iter()
            .find(|f| f.field.name() == name && f.field.modifiers().is_static())
            .map(|f| f.field.clone())
            .ok_or_else(|| SdkError::illegal(format!("{}.{}", ty, name), "no such static field"))?;
        let value = coerce(&value, field.field_type())
            .ok_or_else(|| SdkError::illegal(&field, format!("{} does not fit {}", value, field.field_type())))?;
        entry.statics.insert(name.to_string(), value);
        Ok(())
    }

    /// Run the static initializers of `ty` and its superclasses, root first
    ///
    /// A failed initializer leaves its type erroneous: the failure is
    /// reported again on every later access instead of re-running it.
    fn run_static_init(&self, ty: &TypeHandle) -> SdkResult<()> {
        let mut chain: Vec<TypeHandle> = ty.ancestors().collect();
        chain.reverse();
        for level in &chain {
            self.run_own_static_init(level)?;
        }
        Ok(())
    }

    fn run_own_static_init(&self, ty: &TypeHandle) -> SdkResult<()> {
        let failure = |message: String| SdkError::InvocationFailure {
            member: format!("static initializer of {}", ty),
            message,
        };
        let init = {
            let mut inner = self.inner.write();
            let Some(entry) = inner.entry_mut(ty.name()) else {
                return Ok(());
            };
            match &entry.init_state {
                InitState::Done | InitState::Running => return Ok(()),
                InitState::Failed(message) => return Err(failure(message.clone())),
                InitState::Pending => {}
            }
            entry.init_state = InitState::Running;
            entry.static_init.clone()
        };

        debug!(type_name = ty.name(), "running static initializer");
        let result = init.map_or(Ok(()), |init| init(self, ty));

        let mut inner = self.inner.write();
        if let Some(entry) = inner.entry_mut(ty.name()) {
            entry.init_state = match &result {
                Ok(()) => InitState::Done,
                Err(message) => InitState::Failed(message.clone()),
            };
        }
        result.map_err(failure)
    }

    fn instance_defaults(&self, ty: &TypeHandle) -> Vec<(String, String, Value)> {
        let inner = self.inner.read();
        ty.ancestors()
            .filter_map(|level| inner.entry(level.name()))
            .flat_map(|entry| {
                entry
                    .fields
                    .iter()
                    .filter(|f| !f.field.modifiers().is_static())
                    .map(move |f| (entry.handle.name().to_string(), f.field.name().to_string(), f.initial.clone()))
            })
            .collect()
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Access rules
// ============================================================================

/// Convert `value` for storage in a slot of type `ty`
///
/// Primitive slots take widened primitives; reference slots take null or
/// any value whose runtime type is assignable.
fn coerce(value: &Value, ty: &TypeHandle) -> Option<Value> {
    if let Some(kind) = ty.primitive_kind() {
        return value.widen_to(kind);
    }
    if ty.is_void() {
        return None;
    }
    match value.runtime_type() {
        None => Some(Value::Null),
        Some(actual) if ty.is_assignable_from(&actual) => Some(value.clone()),
        Some(_) => None,
    }
}

fn check_accessible<M: Member>(member: &M) -> SdkResult<()> {
    if member.modifiers().is_public() || member.is_accessible() {
        Ok(())
    } else {
        Err(SdkError::access(member, "member is not accessible"))
    }
}

fn check_receiver<M: Member>(member: &M, instance: Option<&ObjectRef>) -> SdkResult<()> {
    if member.modifiers().is_static() {
        return Ok(());
    }
    let receiver = instance.ok_or_else(|| SdkError::illegal(member, "missing receiver"))?;
    if member.declaring_type().is_assignable_from(receiver.type_handle()) {
        Ok(())
    } else {
        Err(SdkError::illegal(
            member,
            format!("receiver of type {} is not a {}", receiver.type_handle(), member.declaring_type()),
        ))
    }
}

fn coerce_args<C: Callable>(callable: &C, args: &[Value]) -> SdkResult<Vec<Value>> {
    let params = callable.parameter_types();
    if params.len() != args.len() {
        return Err(SdkError::illegal(
            callable,
            format!("expected {} arguments, got {}", params.len(), args.len()),
        ));
    }
    params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (param, arg))| {
            coerce(arg, param).ok_or_else(|| {
                SdkError::illegal(callable, format!("argument {} ({}) does not fit {}", i, arg, param))
            })
        })
        .collect()
}

// ============================================================================
// Collaborator traits
// ============================================================================

impl TypeLoader for ClassRegistry {
    fn find_type(&self, name: &str, initialize: bool) -> SdkResult<TypeHandle> {
        let handle = self
            .lookup(name)
            .ok_or_else(|| SdkError::TypeNotFound(name.to_string()))?;
        if initialize {
            self.run_static_init(&handle)?;
        }
        Ok(handle)
    }

    fn load_type(&self, name: &str) -> SdkResult<TypeHandle> {
        // The definition closure runs unlocked so it may consult the registry.
        let definition = {
            let inner = self.inner.read();
            if let Some(entry) = inner.entry(name) {
                return Ok(entry.handle.clone());
            }
            inner
                .deferred
                .get(name)
                .cloned()
                .ok_or_else(|| SdkError::TypeNotFound(name.to_string()))?
        };
        let builder = definition();
        if builder.name != name {
            return Err(SdkError::InvalidDefinition(format!(
                "deferred definition for {} produced {}",
                name, builder.name
            )));
        }

        let mut inner = self.inner.write();
        if let Some(entry) = inner.entry(name) {
            return Ok(entry.handle.clone());
        }
        let handle =
            Self::define_locked(&mut inner, builder).map_err(|e| SdkError::InvalidDefinition(e.to_string()))?;
        inner.deferred.remove(name);
        Ok(handle)
    }
}

impl ReflectRuntime for ClassRegistry {
    fn declared_fields(&self, ty: &TypeHandle) -> Vec<FieldRef> {
        self.inner
            .read()
            .entry(ty.name())
            .map(|entry| entry.fields.iter().map(|f| f.field.clone()).collect())
            .unwrap_or_default()
    }

    fn declared_methods(&self, ty: &TypeHandle) -> Vec<MethodRef> {
        self.inner
            .read()
            .entry(ty.name())
            .map(|entry| entry.methods.iter().map(|(m, _)| m.clone()).collect())
            .unwrap_or_default()
    }

    fn declared_constructors(&self, ty: &TypeHandle) -> Vec<ConstructorRef> {
        self.inner
            .read()
            .entry(ty.name())
            .map(|entry| entry.constructors.iter().map(|(c, _)| c.clone()).collect())
            .unwrap_or_default()
    }

    fn get(&self, field: &FieldRef, instance: Option<&ObjectRef>) -> SdkResult<Value> {
        check_accessible(field)?;
        check_receiver(field, instance)?;
        let declaring = field.declaring_type();

        if field.modifiers().is_static() {
            self.run_static_init(declaring)?;
            let inner = self.inner.read();
            let entry = inner
                .entry(declaring.name())
                .ok_or_else(|| SdkError::TypeNotFound(declaring.name().to_string()))?;
            return Ok(entry
                .statics
                .get(field.name())
                .cloned()
                .unwrap_or_else(|| Value::default_for(field.field_type())));
        }

        let receiver = instance.ok_or_else(|| SdkError::illegal(field, "missing receiver"))?;
        Ok(receiver
            .get_slot(declaring.name(), field.name())
            .unwrap_or_else(|| Value::default_for(field.field_type())))
    }

    fn set(&self, field: &FieldRef, instance: Option<&ObjectRef>, value: Value) -> SdkResult<()> {
        check_accessible(field)?;
        let mods = field.modifiers();
        if mods.is_final() && (mods.is_static() || !field.is_accessible()) {
            return Err(SdkError::access(field, "field is final"));
        }
        check_receiver(field, instance)?;
        let value = coerce(&value, field.field_type())
            .ok_or_else(|| SdkError::illegal(field, format!("{} does not fit {}", value, field.field_type())))?;
        let declaring = field.declaring_type();

        if mods.is_static() {
            self.run_static_init(declaring)?;
            let mut inner = self.inner.write();
            let entry = inner
                .entry_mut(declaring.name())
                .ok_or_else(|| SdkError::TypeNotFound(declaring.name().to_string()))?;
            entry.statics.insert(field.name().to_string(), value);
            return Ok(());
        }

        let receiver = instance.ok_or_else(|| SdkError::illegal(field, "missing receiver"))?;
        receiver.set_slot(declaring.name(), field.name(), value);
        Ok(())
    }

    fn invoke(&self, method: &MethodRef, instance: Option<&ObjectRef>, args: &[Value]) -> SdkResult<Value> {
        check_accessible(method)?;
        if method.modifiers().contains(Modifiers::ABSTRACT) {
            return Err(SdkError::access(method, "cannot invoke an abstract method"));
        }
        check_receiver(method, instance)?;
        let args = coerce_args(method, args)?;

        let body = {
            let inner = self.inner.read();
            inner
                .entry(method.declaring_type().name())
                .and_then(|entry| entry.methods.iter().find(|(m, _)| m == method))
                .and_then(|(_, body)| body.clone())
        };
        let body = body.ok_or_else(|| SdkError::InvocationFailure {
            member: method.to_string(),
            message: "method has no implementation".to_string(),
        })?;

        let receiver = if method.modifiers().is_static() {
            self.run_static_init(method.declaring_type())?;
            None
        } else {
            instance
        };
        let result = body(receiver, &args).map_err(|message| SdkError::InvocationFailure {
            member: method.to_string(),
            message,
        })?;
        if method.return_type().is_void() {
            Ok(Value::Null)
        } else {
            Ok(result)
        }
    }

    fn construct(&self, ctor: &ConstructorRef, args: &[Value]) -> SdkResult<ObjectRef> {
        check_accessible(ctor)?;
        let ty = ctor.declaring_type().clone();
        if ty.kind() != TypeKind::Class {
            return Err(SdkError::access(ctor, format!("cannot instantiate {}", ty)));
        }
        let args = coerce_args(ctor, args)?;
        self.run_static_init(&ty)?;

        let body = {
            let inner = self.inner.read();
            inner
                .entry(ty.name())
                .and_then(|entry| entry.constructors.iter().find(|(c, _)| c == ctor))
                .and_then(|(_, body)| body.clone())
        };

        let instance = ObjectRef::new(ty.clone());
        for (declaring, name, value) in self.instance_defaults(&ty) {
            instance.set_slot(&declaring, &name, value);
        }
        if let Some(body) = body {
            body(&instance, &args).map_err(|message| SdkError::InvocationFailure {
                member: ctor.to_string(),
                message,
            })?;
        }
        Ok(instance)
    }
}
