use std::fmt;
use std::ops::Add;

use refract_sdk::{Callable, Member, MethodRef, Modifiers, TraitState, TypeHandle, VisibilityMask};

use super::common::{push_params, push_trait, push_type, push_visibility, AnnotationRule, NamePattern};
use super::{And, Filter};
use crate::error::ReflectResult;

/// Filter over methods
#[derive(Debug, Clone, Default)]
pub struct MethodFilter {
    name: NamePattern,
    return_type: Option<TypeHandle>,
    params: Option<Vec<TypeHandle>>,
    visibility: VisibilityMask,
    is_static: TraitState,
    is_final: TraitState,
    is_abstract: TraitState,
    is_native: TraitState,
    is_synchronized: TraitState,
    is_strict: TraitState,
    annotations: AnnotationRule,
}

impl MethodFilter {
    /// Filter that passes every method
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the exact name
    pub fn named(mut self, name: &str) -> Self {
        self.name = NamePattern::exact(name);
        self
    }

    /// Require the name to match `pattern` in full
    pub fn matching(mut self, pattern: &str) -> ReflectResult<Self> {
        self.name = NamePattern::compile(pattern)?;
        Ok(self)
    }

    /// Require exactly this return type
    pub fn returning(mut self, ty: TypeHandle) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Require exactly this parameter list
    ///
    /// This is an identity test on declared types; call-time argument
    /// matching is separate.
    pub fn params(mut self, params: Vec<TypeHandle>) -> Self {
        self.params = Some(params);
        self
    }

    /// Restrict accepted visibilities
    pub fn visibility(mut self, mask: VisibilityMask) -> Self {
        self.visibility = mask;
        self
    }

    /// Static requirement
    pub fn with_static(mut self, state: impl Into<TraitState>) -> Self {
        self.is_static = state.into();
        self
    }

    /// Final requirement
    pub fn with_final(mut self, state: impl Into<TraitState>) -> Self {
        self.is_final = state.into();
        self
    }

    /// Abstract requirement
    pub fn with_abstract(mut self, state: impl Into<TraitState>) -> Self {
        self.is_abstract = state.into();
        self
    }

    /// Native requirement
    pub fn with_native(mut self, state: impl Into<TraitState>) -> Self {
        self.is_native = state.into();
        self
    }

    /// Synchronized requirement
    pub fn with_synchronized(mut self, state: impl Into<TraitState>) -> Self {
        self.is_synchronized = state.into();
        self
    }

    /// Strict floating point requirement
    pub fn with_strict(mut self, state: impl Into<TraitState>) -> Self {
        self.is_strict = state.into();
        self
    }

    /// Require an annotation
    pub fn annotated(mut self, annotation: TypeHandle) -> Self {
        self.annotations.require(annotation);
        self
    }

    /// Forbid an annotation
    pub fn not_annotated(mut self, annotation: TypeHandle) -> Self {
        self.annotations.forbid(annotation);
        self
    }
}

impl Filter<MethodRef> for MethodFilter {
    fn pass(&self, candidate: Option<&MethodRef>) -> bool {
        let Some(method) = candidate else {
            return false;
        };
        if !self.name.is_match(method.name()) {
            return false;
        }
        if let Some(ty) = &self.return_type {
            if method.return_type() != ty {
                return false;
            }
        }

        let mods = method.modifiers();
        let traits_ok = self.visibility.admits(mods)
            && self.is_static.admits(mods.contains(Modifiers::STATIC))
            && self.is_final.admits(mods.contains(Modifiers::FINAL))
            && self.is_abstract.admits(mods.contains(Modifiers::ABSTRACT))
            && self.is_native.admits(mods.contains(Modifiers::NATIVE))
            && self.is_synchronized.admits(mods.contains(Modifiers::SYNCHRONIZED))
            && self.is_strict.admits(mods.contains(Modifiers::STRICT));
        if !traits_ok || !self.annotations.admits(method) {
            return false;
        }

        match &self.params {
            Some(params) => params.as_slice() == method.parameter_types(),
            None => true,
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        push_visibility(&mut out, self.visibility);
        push_trait(&mut out, self.is_static, "static");
        push_trait(&mut out, self.is_final, "final");
        push_trait(&mut out, self.is_abstract, "abstract");
        push_trait(&mut out, self.is_native, "native");
        push_trait(&mut out, self.is_synchronized, "synchronized");
        push_trait(&mut out, self.is_strict, "strictfp");
        push_type(&mut out, self.return_type.as_ref());
        out.push_str(self.name.as_str());
        push_params(&mut out, self.params.as_deref());
        f.write_str(&out)
    }
}

impl<R: Filter<MethodRef>> Add<R> for MethodFilter {
    type Output = And<MethodFilter, R>;

    fn add(self, rhs: R) -> Self::Output {
        And::new(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_sdk::{builtin, PrimitiveKind, TypeKind};

    fn service() -> TypeHandle {
        TypeHandle::new("app.Service", TypeKind::Class, Some(builtin::object()), vec![])
    }

    fn method(name: &str, params: Vec<TypeHandle>, ret: TypeHandle, mods: Modifiers) -> MethodRef {
        MethodRef::new(name, service(), params, ret, mods, vec![]).unwrap()
    }

    #[test]
    fn test_name_pattern_and_return_type() {
        let getter = method("getName", vec![], builtin::string(), Modifiers::PUBLIC);
        let setter = method("setName", vec![builtin::string()], builtin::void(), Modifiers::PUBLIC);

        let getters = MethodFilter::new().matching("get[A-Z].*").unwrap();
        assert!(getters.pass(Some(&getter)));
        assert!(!getters.pass(Some(&setter)));

        let returns_void = MethodFilter::new().returning(builtin::void());
        assert!(returns_void.pass(Some(&setter)));
        assert!(!returns_void.pass(Some(&getter)));
    }

    #[test]
    fn test_exact_params_are_identity() {
        let int = builtin::primitive(PrimitiveKind::Int);
        let add = method("add", vec![int.clone(), int.clone()], int.clone(), Modifiers::PUBLIC);

        assert!(MethodFilter::new().params(vec![int.clone(), int.clone()]).pass(Some(&add)));
        assert!(!MethodFilter::new().params(vec![int.clone()]).pass(Some(&add)));
        let boxed = builtin::wrapper(PrimitiveKind::Int);
        assert!(!MethodFilter::new().params(vec![boxed.clone(), boxed]).pass(Some(&add)));
    }

    #[test]
    fn test_method_traits() {
        let run = method(
            "run",
            vec![],
            builtin::void(),
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
        );
        let lock = method(
            "lock",
            vec![],
            builtin::void(),
            Modifiers::PRIVATE | Modifiers::SYNCHRONIZED | Modifiers::NATIVE | Modifiers::STRICT,
        );

        assert!(MethodFilter::new().with_abstract(true).pass(Some(&run)));
        assert!(!MethodFilter::new().with_abstract(true).pass(Some(&lock)));
        assert!(MethodFilter::new()
            .with_synchronized(true)
            .with_native(true)
            .with_strict(true)
            .with_final(false)
            .pass(Some(&lock)));
        assert!(!MethodFilter::new().with_native(false).pass(Some(&lock)));
    }

    #[test]
    fn test_description() {
        let filter = MethodFilter::new()
            .visibility(VisibilityMask::PUBLIC)
            .with_static(true)
            .with_abstract(false)
            .returning(builtin::string())
            .named("format")
            .params(vec![builtin::string(), builtin::primitive(PrimitiveKind::Int)]);
        assert_eq!(filter.to_string(), "public static not-abstract String format(String,int)");
        assert_eq!(
            MethodFilter::new().with_strict(true).to_string(),
            "public/protected/default/private strictfp .*(...)"
        );
    }
}
