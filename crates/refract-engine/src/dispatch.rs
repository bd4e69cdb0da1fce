//! Filter-driven invocation
//!
//! [`Reflector`] resolves a member with a filter, checks the permission
//! store, and performs the access through the runtime primitives. Selection
//! is first match in walk order (declaration order, then ancestor order);
//! there is no best-match ranking.
//!
//! # Forced final writes
//!
//! [`Reflector::write_static_field`] suspends the final bit of the resolved
//! field for the duration of the write. The descriptor is shared process-wide,
//! so the override is visible to every thread while it lasts. Callers must
//! serialize concurrent writes to the same final field, and the store must
//! grant [`ReflectionPermission::FORCE_FINAL`] for the declaring type.
//!
//! [`ReflectionPermission::FORCE_FINAL`]: crate::permissions::ReflectionPermission::FORCE_FINAL

use std::sync::Arc;

use refract_sdk::{
    Callable, ConstructorRef, FieldRef, Member, MethodRef, Modifiers, ObjectRef, ReflectRuntime, TypeHandle,
    TypeLoader, Value,
};
use tracing::{debug, trace, warn};

use crate::error::{ReflectError, ReflectResult};
use crate::filter::{And, FieldFilter, Filter, MethodFilter};
use crate::finder;
use crate::loader::{self, LoaderContext};
use crate::matcher;
use crate::permissions::{self, PermissionStore};
use crate::registry::ClassRegistry;

/// Clears FINAL on a field until dropped
struct FinalOverride {
    field: FieldRef,
    original: Modifiers,
}

impl FinalOverride {
    fn new(field: &FieldRef) -> Self {
        let original = field.modifiers();
        warn!(field = %field, "suspending final modifier for forced write");
        field.set_modifiers(original - Modifiers::FINAL);
        Self {
            field: field.clone(),
            original,
        }
    }
}

impl Drop for FinalOverride {
    fn drop(&mut self) {
        self.field.set_modifiers(self.original);
    }
}

/// Reflective dispatcher over a runtime and a permission store
pub struct Reflector {
    runtime: Arc<dyn ReflectRuntime>,
    loader: LoaderContext,
    permissions: PermissionStore,
}

impl Reflector {
    /// Dispatcher over `runtime`, resolving types through the default loader
    pub fn new(runtime: Arc<dyn ReflectRuntime>) -> Self {
        Self {
            runtime,
            loader: LoaderContext::new(),
            permissions: PermissionStore::new(),
        }
    }

    /// Dispatcher using `registry` as both runtime and loader
    pub fn for_registry(registry: Arc<ClassRegistry>) -> Self {
        let loader: Arc<dyn TypeLoader> = registry.clone();
        Self::new(registry).with_loader(loader)
    }

    /// Resolve types through `loader` instead of the default loader
    pub fn with_loader(mut self, loader: Arc<dyn TypeLoader>) -> Self {
        self.loader = LoaderContext::with_loader(loader);
        self
    }

    /// Replace the permission store
    pub fn with_permissions(mut self, permissions: PermissionStore) -> Self {
        self.permissions = permissions;
        self
    }

    /// Underlying runtime
    pub fn runtime(&self) -> &dyn ReflectRuntime {
        self.runtime.as_ref()
    }

    /// Permission store
    pub fn permissions(&self) -> &PermissionStore {
        &self.permissions
    }

    /// Mutable permission store
    pub fn permissions_mut(&mut self) -> &mut PermissionStore {
        &mut self.permissions
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Resolve a type name through the configured loader
    pub fn load_type(&self, name: &str, initialize: bool) -> ReflectResult<TypeHandle> {
        loader::load_type_in(&self.loader, name, initialize)
    }

    /// Fields of `ty` passing `filter`
    pub fn fields<F: Filter<FieldRef> + ?Sized>(
        &self,
        ty: &TypeHandle,
        include_ancestors: bool,
        filter: &F,
    ) -> Vec<FieldRef> {
        finder::fields(self.runtime(), ty, include_ancestors, filter)
    }

    /// Methods of `ty` passing `filter`
    pub fn methods<F: Filter<MethodRef> + ?Sized>(
        &self,
        ty: &TypeHandle,
        include_ancestors: bool,
        filter: &F,
    ) -> Vec<MethodRef> {
        finder::methods(self.runtime(), ty, include_ancestors, filter)
    }

    /// Constructors of `ty` passing `filter`
    pub fn constructors<F: Filter<ConstructorRef> + ?Sized>(
        &self,
        ty: &TypeHandle,
        include_ancestors: bool,
        filter: &F,
    ) -> Vec<ConstructorRef> {
        finder::constructors(self.runtime(), ty, include_ancestors, filter)
    }

    /// First field of `ty` passing `filter`
    pub fn first_field<F: Filter<FieldRef> + ?Sized>(
        &self,
        ty: &TypeHandle,
        include_ancestors: bool,
        filter: &F,
    ) -> ReflectResult<FieldRef> {
        finder::first_field(self.runtime(), ty, include_ancestors, filter)
    }

    /// First method of `ty` passing `filter`
    pub fn first_method<F: Filter<MethodRef> + ?Sized>(
        &self,
        ty: &TypeHandle,
        include_ancestors: bool,
        filter: &F,
    ) -> ReflectResult<MethodRef> {
        finder::first_method(self.runtime(), ty, include_ancestors, filter)
    }

    /// First constructor of `ty` passing `filter`
    pub fn first_constructor<F: Filter<ConstructorRef> + ?Sized>(
        &self,
        ty: &TypeHandle,
        include_ancestors: bool,
        filter: &F,
    ) -> ReflectResult<ConstructorRef> {
        finder::first_constructor(self.runtime(), ty, include_ancestors, filter)
    }

    // ========================================================================
    // Invocation
    // ========================================================================

    /// First callable of `ty` or its ancestors passing `filter` and accepting `args`
    fn select_callable<M, F>(&self, ty: &TypeHandle, filter: &F, args: &[Value]) -> ReflectResult<M>
    where
        M: Callable,
        F: Filter<M> + ?Sized,
    {
        let signature = matcher::signature_of(self.runtime(), args);
        let candidates: Vec<M> = finder::members(self.runtime(), ty, true, filter);
        debug!(
            kind = %M::KIND,
            type_name = ty.name(),
            candidates = candidates.len(),
            signature = %matcher::describe_signature(&signature),
            "selecting callable"
        );

        for candidate in candidates {
            if matcher::is_call_compatible(candidate.parameter_types(), &signature) {
                debug!(kind = %M::KIND, member = %candidate, "selected callable");
                return Ok(candidate);
            }
            trace!(kind = %M::KIND, member = %candidate, "arguments not accepted");
        }

        Err(ReflectError::NoSuchCallable {
            kind: M::KIND,
            filter: filter.to_string(),
            type_name: ty.simple_name().to_string(),
            signature: matcher::describe_signature(&signature),
        })
    }

    /// Construct an instance with the first constructor accepting `args`
    ///
    /// Constructors declared by ancestors are candidates too, after those of
    /// `ty` itself.
    pub fn call_constructor<F: Filter<ConstructorRef> + ?Sized>(
        &self,
        ty: &TypeHandle,
        filter: &F,
        args: &[Value],
    ) -> ReflectResult<ObjectRef> {
        let ctor: ConstructorRef = self.select_callable(ty, filter, args)?;
        permissions::check_invoke(&self.permissions, ctor.declaring_type(), !ctor.modifiers().is_public())?;
        Ok(self.runtime.construct(&ctor, args)?)
    }

    /// Invoke the first method of the receiver's type chain accepting `args`
    pub fn call_method<F: Filter<MethodRef> + ?Sized>(
        &self,
        obj: &ObjectRef,
        filter: &F,
        args: &[Value],
    ) -> ReflectResult<Value> {
        let ty = obj.type_handle();
        let method: MethodRef = self.select_callable(ty, filter, args)?;
        permissions::check_invoke(&self.permissions, ty, !method.modifiers().is_public())?;
        Ok(self.runtime.invoke(&method, Some(obj), args)?)
    }

    /// Invoke the first static method of `ty` (or an ancestor) accepting `args`
    pub fn call_static_method<F: Filter<MethodRef> + ?Sized>(
        &self,
        ty: &TypeHandle,
        filter: &F,
        args: &[Value],
    ) -> ReflectResult<Value> {
        let filter = And::new(filter, MethodFilter::new().with_static(true));
        let method: MethodRef = self.select_callable(ty, &filter, args)?;
        permissions::check_invoke(&self.permissions, ty, !method.modifiers().is_public())?;
        Ok(self.runtime.invoke(&method, None, args)?)
    }

    // ========================================================================
    // Field access
    // ========================================================================

    /// Read the first instance field of `obj` passing `filter`
    pub fn read_field<F: Filter<FieldRef> + ?Sized>(
        &self,
        obj: &ObjectRef,
        include_ancestors: bool,
        filter: &F,
    ) -> ReflectResult<Value> {
        let ty = obj.type_handle();
        let filter = And::new(filter, FieldFilter::new().with_static(false));
        let field = self.first_field(ty, include_ancestors, &filter)?;
        permissions::check_field_read(&self.permissions, ty, !field.modifiers().is_public())?;
        Ok(self.runtime.get(&field, Some(obj))?)
    }

    /// Write the first instance field of `obj` passing `filter`
    pub fn write_field<F: Filter<FieldRef> + ?Sized>(
        &self,
        obj: &ObjectRef,
        include_ancestors: bool,
        filter: &F,
        value: Value,
    ) -> ReflectResult<()> {
        let ty = obj.type_handle();
        let filter = And::new(filter, FieldFilter::new().with_static(false));
        let field = self.first_field(ty, include_ancestors, &filter)?;
        permissions::check_field_write(&self.permissions, ty, !field.modifiers().is_public())?;
        debug!(field = %field, value = %value, "writing field");
        Ok(self.runtime.set(&field, Some(obj), value)?)
    }

    /// Read the first static field of `ty` or its ancestors passing `filter`
    pub fn read_static_field<F: Filter<FieldRef> + ?Sized>(&self, ty: &TypeHandle, filter: &F) -> ReflectResult<Value> {
        let filter = And::new(filter, FieldFilter::new().with_static(true));
        let field = self.first_field(ty, true, &filter)?;
        permissions::check_field_read(&self.permissions, ty, !field.modifiers().is_public())?;
        Ok(self.runtime.get(&field, None)?)
    }

    /// Write the first static field of `ty` or its ancestors passing `filter`
    ///
    /// A final field is overwritten by suspending its final bit; the bit is
    /// restored before returning, whether or not the write succeeded.
    pub fn write_static_field<F: Filter<FieldRef> + ?Sized>(
        &self,
        ty: &TypeHandle,
        filter: &F,
        value: Value,
    ) -> ReflectResult<()> {
        let filter = And::new(filter, FieldFilter::new().with_static(true));
        let field = self.first_field(ty, true, &filter)?;
        permissions::check_field_write(&self.permissions, ty, !field.modifiers().is_public())?;
        debug!(field = %field, value = %value, "writing static field");

        if field.modifiers().is_final() {
            permissions::check_force_final(&self.permissions, ty)?;
            let _restore = FinalOverride::new(&field);
            return Ok(self.runtime.set(&field, None, value)?);
        }
        Ok(self.runtime.set(&field, None, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ClassBuilder, FieldDef};
    use refract_sdk::builtin;

    fn holder() -> (Reflector, TypeHandle) {
        let registry = Arc::new(ClassRegistry::new());
        let ty = registry
            .define(
                ClassBuilder::new("app.Holder")
                    .add_field(FieldDef::new("VERSION", "String").public().as_static().as_final().initial_value(Value::str("1")))
                    .add_field(FieldDef::new("secret", "int").private()),
            )
            .unwrap();
        (Reflector::for_registry(registry), ty)
    }

    #[test]
    fn test_final_override_restores_on_drop() {
        let (reflector, ty) = holder();
        let field = reflector.first_field(&ty, false, &FieldFilter::new().named("VERSION")).unwrap();
        {
            let _restore = FinalOverride::new(&field);
            assert!(!field.modifiers().is_final());
        }
        assert!(field.modifiers().is_final());
        assert!(field.modifiers().is_static());
    }

    #[test]
    fn test_final_bit_restored_after_failed_write() {
        let (reflector, ty) = holder();
        let err = reflector
            .write_static_field(&ty, &FieldFilter::new().named("VERSION"), Value::Int(2))
            .unwrap_err();
        assert!(matches!(err, ReflectError::IllegalValue { .. }));

        let field = reflector.first_field(&ty, false, &FieldFilter::new().named("VERSION")).unwrap();
        assert!(field.modifiers().is_final());
        assert_eq!(
            reflector.read_static_field(&ty, &FieldFilter::new().named("VERSION")).unwrap(),
            Value::str("1")
        );
    }

    #[test]
    fn test_static_filter_excludes_instance_fields() {
        let (reflector, ty) = holder();
        let err = reflector
            .read_static_field(&ty, &FieldFilter::new().named("secret"))
            .unwrap_err();
        assert!(matches!(err, ReflectError::MemberNotFound { .. }));
    }

    #[test]
    fn test_load_type_uses_registry() {
        let (reflector, ty) = holder();
        assert_eq!(reflector.load_type("app.Holder", true).unwrap(), ty);
        assert_eq!(reflector.load_type("String", false).unwrap(), builtin::string());
        assert!(matches!(
            reflector.load_type("app.Missing", false),
            Err(ReflectError::TypeNotFound { .. })
        ));
    }
}
