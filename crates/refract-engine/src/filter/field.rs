use std::fmt;
use std::ops::Add;

use refract_sdk::{FieldRef, Member, Modifiers, TraitState, TypeHandle, VisibilityMask};

use super::common::{push_trait, push_type, push_visibility, AnnotationRule, NamePattern};
use super::{And, Filter};
use crate::error::ReflectResult;

/// Filter over fields
///
/// Every criterion defaults to "don't care": any name, any type, any
/// visibility, every trait `Either`, no annotation requirements.
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    name: NamePattern,
    field_type: Option<TypeHandle>,
    visibility: VisibilityMask,
    is_static: TraitState,
    is_final: TraitState,
    is_transient: TraitState,
    is_volatile: TraitState,
    annotations: AnnotationRule,
}

impl FieldFilter {
    /// Filter that passes every field
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

    /// Require exactly this value type
    pub fn of_type(mut self, ty: TypeHandle) -> Self {
        self.field_type = Some(ty);
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

    /// Transient requirement
    pub fn with_transient(mut self, state: impl Into<TraitState>) -> Self {
        self.is_transient = state.into();
        self
    }

    /// Volatile requirement
    pub fn with_volatile(mut self, state: impl Into<TraitState>) -> Self {
        self.is_volatile = state.into();
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

impl Filter<FieldRef> for FieldFilter {
    fn pass(&self, candidate: Option<&FieldRef>) -> bool {
        let Some(field) = candidate else {
            return false;
        };
        if !self.name.is_match(field.name()) {
            return false;
        }
        if let Some(ty) = &self.field_type {
            if field.field_type() != ty {
                return false;
            }
        }

        let mods = field.modifiers();
        self.visibility.admits(mods)
            && self.is_static.admits(mods.contains(Modifiers::STATIC))
            && self.is_final.admits(mods.contains(Modifiers::FINAL))
            && self.is_transient.admits(mods.contains(Modifiers::TRANSIENT))
            && self.is_volatile.admits(mods.contains(Modifiers::VOLATILE))
            && self.annotations.admits(field)
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        push_visibility(&mut out, self.visibility);
        push_trait(&mut out, self.is_static, "static");
        push_trait(&mut out, self.is_final, "final");
        push_trait(&mut out, self.is_transient, "transient");
        push_trait(&mut out, self.is_volatile, "volatile");
        push_type(&mut out, self.field_type.as_ref());
        out.push_str(self.name.as_str());
        f.write_str(&out)
    }
}

impl<R: Filter<FieldRef>> Add<R> for FieldFilter {
    type Output = And<FieldFilter, R>;

    fn add(self, rhs: R) -> Self::Output {
        And::new(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_sdk::{builtin, PrimitiveKind, TypeKind};

    fn holder() -> TypeHandle {
        TypeHandle::new("app.Holder", TypeKind::Class, Some(builtin::object()), vec![])
    }

    fn marker() -> TypeHandle {
        TypeHandle::new("app.Marker", TypeKind::Annotation, None, vec![])
    }

    fn field(name: &str, ty: TypeHandle, mods: Modifiers) -> FieldRef {
        FieldRef::new(name, holder(), ty, mods, vec![]).unwrap()
    }

    #[test]
    fn test_default_passes_everything_but_none() {
        let filter = FieldFilter::new();
        let int = builtin::primitive(PrimitiveKind::Int);
        assert!(filter.pass(Some(&field("a", int.clone(), Modifiers::PRIVATE))));
        assert!(filter.pass(Some(&field("b", int, Modifiers::STATIC))));
        assert!(!filter.pass(None));
    }

    #[test]
    fn test_exact_type_is_not_coerced() {
        let filter = FieldFilter::new().of_type(builtin::wrapper(PrimitiveKind::Int));
        assert!(!filter.pass(Some(&field("n", builtin::primitive(PrimitiveKind::Int), Modifiers::PUBLIC))));
        assert!(filter.pass(Some(&field("n", builtin::wrapper(PrimitiveKind::Int), Modifiers::PUBLIC))));
    }

    #[test]
    fn test_traits() {
        let constant = field(
            "MAX",
            builtin::primitive(PrimitiveKind::Long),
            Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL,
        );
        let counter = field("count", builtin::primitive(PrimitiveKind::Long), Modifiers::VOLATILE);

        let statics = FieldFilter::new().with_static(true).with_final(Some(true));
        assert!(statics.pass(Some(&constant)));
        assert!(!statics.pass(Some(&counter)));

        let volatile_instance = FieldFilter::new().with_static(false).with_volatile(true);
        assert!(volatile_instance.pass(Some(&counter)));
        assert!(!volatile_instance.pass(Some(&constant)));

        let not_transient = FieldFilter::new().with_transient(false);
        assert!(not_transient.pass(Some(&counter)));
    }

    #[test]
    fn test_package_visibility() {
        let package_only = FieldFilter::new().visibility(VisibilityMask::PACKAGE);
        let string = builtin::string();
        assert!(package_only.pass(Some(&field("p", string.clone(), Modifiers::STATIC))));
        assert!(!package_only.pass(Some(&field("q", string.clone(), Modifiers::PROTECTED))));

        let public_only = FieldFilter::new().visibility(VisibilityMask::PUBLIC);
        assert!(!public_only.pass(Some(&field("p", string, Modifiers::empty()))));
    }

    #[test]
    fn test_annotations() {
        let tagged = FieldRef::new(
            "id",
            holder(),
            builtin::string(),
            Modifiers::PRIVATE,
            vec![marker()],
        )
        .unwrap();
        let plain = field("name", builtin::string(), Modifiers::PRIVATE);

        let required = FieldFilter::new().annotated(marker());
        assert!(required.pass(Some(&tagged)));
        assert!(!required.pass(Some(&plain)));

        let forbidden = FieldFilter::new().not_annotated(marker());
        assert!(!forbidden.pass(Some(&tagged)));
        assert!(forbidden.pass(Some(&plain)));
    }

    #[test]
    fn test_description() {
        let filter = FieldFilter::new()
            .visibility(VisibilityMask::PUBLIC | VisibilityMask::PRIVATE)
            .with_static(true)
            .with_volatile(false)
            .of_type(builtin::string())
            .matching("na.*")
            .unwrap();
        assert_eq!(filter.to_string(), "public/private static not-volatile String na.*");
        assert_eq!(
            FieldFilter::new().to_string(),
            "public/protected/default/private .*"
        );
    }

    #[test]
    fn test_add_composes() {
        let both = FieldFilter::new().named("MAX") + FieldFilter::new().with_static(true);
        let constant = field(
            "MAX",
            builtin::primitive(PrimitiveKind::Int),
            Modifiers::STATIC | Modifiers::FINAL,
        );
        let instance = field("MAX", builtin::primitive(PrimitiveKind::Int), Modifiers::FINAL);
        assert!(both.pass(Some(&constant)));
        assert!(!both.pass(Some(&instance)));
        assert_eq!(
            both.to_string(),
            "public/protected/default/private MAX && public/protected/default/private static .*"
        );
    }
}
