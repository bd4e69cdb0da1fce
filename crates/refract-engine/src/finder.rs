//! Member enumeration over a type and its ancestors
//!
//! Walk order is the type itself, then each superclass up to the root, and
//! declaration order within each type. Every member examined by a walk is
//! marked accessible.

use refract_sdk::{ConstructorRef, FieldRef, Member, MethodRef, ReflectRuntime, TypeHandle};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::error::{ReflectError, ReflectResult};
use crate::filter::Filter;

/// Iterator over a type and, optionally, its ancestor chain
pub struct Lineage<'a> {
    runtime: &'a dyn ReflectRuntime,
    next: Option<TypeHandle>,
    include_ancestors: bool,
}

impl<'a> Lineage<'a> {
    /// Walk starting at `ty`
    pub fn new(runtime: &'a dyn ReflectRuntime, ty: &TypeHandle, include_ancestors: bool) -> Self {
        Self {
            runtime,
            next: Some(ty.clone()),
            include_ancestors,
        }
    }
}

impl Iterator for Lineage<'_> {
    type Item = TypeHandle;

    fn next(&mut self) -> Option<TypeHandle> {
        let current = self.next.take()?;
        if self.include_ancestors {
            self.next = self.runtime.superclass_of(&current);
        }
        Some(current)
    }
}

/// Examined members in walk order, each marked accessible
fn examined<'a, M: Member>(
    runtime: &'a dyn ReflectRuntime,
    ty: &TypeHandle,
    include_ancestors: bool,
) -> impl Iterator<Item = M> + 'a {
    Lineage::new(runtime, ty, include_ancestors)
        .flat_map(move |level| M::declared_in(runtime, &level))
        .inspect(|member| member.set_accessible(true))
}

/// All members of kind `M` passing `filter`
///
/// Results keep walk order and contain each declaration once.
pub fn members<M, F>(
    runtime: &dyn ReflectRuntime,
    ty: &TypeHandle,
    include_ancestors: bool,
    filter: &F,
) -> Vec<M>
where
    M: Member,
    F: Filter<M> + ?Sized,
{
    let mut seen = FxHashSet::default();
    let mut found = Vec::new();
    for member in examined::<M>(runtime, ty, include_ancestors) {
        if !filter.pass(Some(&member)) {
            trace!(kind = %M::KIND, member = %member, "rejected by filter");
            continue;
        }
        if seen.insert(member.clone()) {
            found.push(member);
        }
    }
    debug!(
        kind = %M::KIND,
        type_name = ty.name(),
        include_ancestors,
        filter = %filter,
        count = found.len(),
        "enumerated members"
    );
    found
}

/// First member of kind `M` passing `filter`, in walk order
pub fn first_member<M, F>(
    runtime: &dyn ReflectRuntime,
    ty: &TypeHandle,
    include_ancestors: bool,
    filter: &F,
) -> ReflectResult<M>
where
    M: Member,
    F: Filter<M> + ?Sized,
{
    let found = examined::<M>(runtime, ty, include_ancestors).find(|member| filter.pass(Some(member)));
    match found {
        Some(member) => {
            debug!(kind = %M::KIND, member = %member, "found member");
            Ok(member)
        }
        None => Err(ReflectError::MemberNotFound {
            kind: M::KIND,
            filter: filter.to_string(),
            type_name: ty.simple_name().to_string(),
        }),
    }
}

/// Fields of `ty` (and its ancestors) passing `filter`
pub fn fields<F: Filter<FieldRef> + ?Sized>(
    runtime: &dyn ReflectRuntime,
    ty: &TypeHandle,
    include_ancestors: bool,
    filter: &F,
) -> Vec<FieldRef> {
    members(runtime, ty, include_ancestors, filter)
}

/// Methods of `ty` (and its ancestors) passing `filter`
pub fn methods<F: Filter<MethodRef> + ?Sized>(
    runtime: &dyn ReflectRuntime,
    ty: &TypeHandle,
    include_ancestors: bool,
    filter: &F,
) -> Vec<MethodRef> {
    members(runtime, ty, include_ancestors, filter)
}

/// Constructors of `ty` (and its ancestors) passing `filter`
pub fn constructors<F: Filter<ConstructorRef> + ?Sized>(
    runtime: &dyn ReflectRuntime,
    ty: &TypeHandle,
    include_ancestors: bool,
    filter: &F,
) -> Vec<ConstructorRef> {
    members(runtime, ty, include_ancestors, filter)
}

/// First field passing `filter`
pub fn first_field<F: Filter<FieldRef> + ?Sized>(
    runtime: &dyn ReflectRuntime,
    ty: &TypeHandle,
    include_ancestors: bool,
    filter: &F,
) -> ReflectResult<FieldRef> {
    first_member(runtime, ty, include_ancestors, filter)
}

/// First method passing `filter`
pub fn first_method<F: Filter<MethodRef> + ?Sized>(
    runtime: &dyn ReflectRuntime,
    ty: &TypeHandle,
    include_ancestors: bool,
    filter: &F,
) -> ReflectResult<MethodRef> {
    first_member(runtime, ty, include_ancestors, filter)
}

/// First constructor passing `filter`
pub fn first_constructor<F: Filter<ConstructorRef> + ?Sized>(
    runtime: &dyn ReflectRuntime,
    ty: &TypeHandle,
    include_ancestors: bool,
    filter: &F,
) -> ReflectResult<ConstructorRef> {
    first_member(runtime, ty, include_ancestors, filter)
}
