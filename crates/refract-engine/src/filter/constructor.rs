use std::fmt;
use std::ops::Add;

use refract_sdk::{Callable, ConstructorRef, Member, TypeHandle, VisibilityMask};

use super::common::{push_params, push_type, push_visibility, AnnotationRule};
use super::{And, Filter};

/// Filter over constructors
#[derive(Debug, Clone, Default)]
pub struct ConstructorFilter {
    params: Option<Vec<TypeHandle>>,
    visibility: VisibilityMask,
    declared_by: Option<TypeHandle>,
    annotations: AnnotationRule,
}

impl ConstructorFilter {
    /// Filter that passes every constructor
    pub fn new() -> Self {
        Self::default()
    }

    /// Require exactly this parameter list
    pub fn params(mut self, params: Vec<TypeHandle>) -> Self {
        self.params = Some(params);
        self
    }

    /// Restrict accepted visibilities
    pub fn visibility(mut self, mask: VisibilityMask) -> Self {
        self.visibility = mask;
        self
    }

    /// Require the constructor to be declared by `ty`
    pub fn declared_by(mut self, ty: TypeHandle) -> Self {
        self.declared_by = Some(ty);
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

impl Filter<ConstructorRef> for ConstructorFilter {
    fn pass(&self, candidate: Option<&ConstructorRef>) -> bool {
        let Some(ctor) = candidate else {
            return false;
        };
        if !self.visibility.admits(ctor.modifiers()) {
            return false;
        }
        if let Some(ty) = &self.declared_by {
            if ctor.declaring_type() != ty {
                return false;
            }
        }
        if let Some(params) = &self.params {
            if params.as_slice() != ctor.parameter_types() {
                return false;
            }
        }
        self.annotations.admits(ctor)
    }
}

impl fmt::Display for ConstructorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        push_visibility(&mut out, self.visibility);
        push_type(&mut out, self.declared_by.as_ref());
        push_params(&mut out, self.params.as_deref());
        f.write_str(&out)
    }
}

impl<R: Filter<ConstructorRef>> Add<R> for ConstructorFilter {
    type Output = And<ConstructorFilter, R>;

    fn add(self, rhs: R) -> Self::Output {
        And::new(self, rhs)
    }
}
