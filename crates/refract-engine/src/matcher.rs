//! Call-argument compatibility
//!
//! Arguments are boxed at the call boundary, so a primitive parameter and its
//! wrapper accept the same arguments. The primitive/wrapper table is closed
//! over the eight [`PrimitiveKind`]s.

use refract_sdk::{builtin, PrimitiveKind, ReflectRuntime, TypeHandle, Value};

/// Wrapper type for a primitive; any other type maps to itself
pub fn wrap(ty: &TypeHandle) -> TypeHandle {
    match ty.primitive_kind() {
        Some(kind) => builtin::wrapper(kind),
        None => ty.clone(),
    }
}

/// Primitive type for a wrapper; any other type maps to itself
pub fn unwrap(ty: &TypeHandle) -> TypeHandle {
    match PrimitiveKind::from_wrapper_name(ty.name()) {
        Some(kind) if *ty == builtin::wrapper(kind) => builtin::primitive(kind),
        _ => ty.clone(),
    }
}

/// Whether a parameter declared as `declared` accepts an argument of `arg`
///
/// An unconstrained parameter (`None`) and a null argument (`None`) are
/// always accepted.
pub fn accepts(declared: Option<&TypeHandle>, arg: Option<&TypeHandle>) -> bool {
    match (declared, arg) {
        (Some(declared), Some(arg)) => wrap(declared).is_assignable_from(&wrap(arg)),
        _ => true,
    }
}

/// Negation of [`accepts`]
pub fn cannot_accept(declared: Option<&TypeHandle>, arg: Option<&TypeHandle>) -> bool {
    !accepts(declared, arg)
}

/// Runtime type of every argument, `None` for nulls
pub fn signature_of(runtime: &dyn ReflectRuntime, args: &[Value]) -> Vec<Option<TypeHandle>> {
    args.iter().map(|arg| runtime.runtime_type_of(arg)).collect()
}

/// Render a signature as `(Integer,null,String)`
pub fn describe_signature(signature: &[Option<TypeHandle>]) -> String {
    let parts: Vec<&str> = signature
        .iter()
        .map(|ty| ty.as_ref().map_or("null", |ty| ty.simple_name()))
        .collect();
    format!("({})", parts.join(","))
}

/// Equal arity and every position accepted
pub fn is_call_compatible(params: &[TypeHandle], signature: &[Option<TypeHandle>]) -> bool {
    params.len() == signature.len()
        && params
            .iter()
            .zip(signature)
            .all(|(param, arg)| accepts(Some(param), arg.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_sdk::TypeKind;

    #[test]
    fn test_wrap_table_is_bidirectional() {
        for kind in PrimitiveKind::ALL {
            let primitive = builtin::primitive(kind);
            let wrapper = builtin::wrapper(kind);
            assert_eq!(wrap(&primitive), wrapper);
            assert_eq!(unwrap(&wrapper), primitive);
            assert_eq!(wrap(&wrapper), wrapper);
            assert_eq!(unwrap(&primitive), primitive);
        }
        assert_eq!(wrap(&builtin::string()), builtin::string());
    }

    #[test]
    fn test_boxing_equivalence() {
        for kind in PrimitiveKind::ALL {
            let primitive = builtin::primitive(kind);
            let wrapper = builtin::wrapper(kind);
            assert!(accepts(Some(&primitive), Some(&wrapper)), "{:?}", kind);
            assert!(accepts(Some(&wrapper), Some(&primitive)), "{:?}", kind);
        }
    }

    #[test]
    fn test_unrelated_types_rejected() {
        let integer = builtin::wrapper(PrimitiveKind::Int);
        assert!(!accepts(Some(&builtin::string()), Some(&integer)));
        assert!(cannot_accept(Some(&builtin::string()), Some(&integer)));
        assert!(!accepts(
            Some(&builtin::primitive(PrimitiveKind::Long)),
            Some(&integer)
        ));
    }

    #[test]
    fn test_wildcards() {
        let string = builtin::string();
        assert!(accepts(None, Some(&string)));
        assert!(accepts(Some(&string), None));
        assert!(accepts(Some(&builtin::primitive(PrimitiveKind::Int)), None));
        assert!(accepts(None, None));
    }

    #[test]
    fn test_supertype_accepts_subtype() {
        let number = builtin::number();
        let int = builtin::primitive(PrimitiveKind::Int);
        assert!(accepts(Some(&number), Some(&int)));
        assert!(accepts(Some(&builtin::object()), Some(&int)));
        assert!(!accepts(Some(&int), Some(&number)));

        let base = TypeHandle::new("app.Base", TypeKind::Class, Some(builtin::object()), vec![]);
        let derived = TypeHandle::new("app.Derived", TypeKind::Class, Some(base.clone()), vec![]);
        assert!(accepts(Some(&base), Some(&derived)));
        assert!(!accepts(Some(&derived), Some(&base)));
    }

    #[test]
    fn test_call_compatibility() {
        let int = builtin::primitive(PrimitiveKind::Int);
        let params = vec![int.clone(), builtin::string()];
        let sig = vec![Some(builtin::wrapper(PrimitiveKind::Int)), None];
        assert!(is_call_compatible(&params, &sig));
        assert!(!is_call_compatible(&params, &sig[..1]));
        assert!(!is_call_compatible(&params, &[Some(builtin::string()), None]));
        assert_eq!(describe_signature(&sig), "(Integer,null)");
        assert_eq!(describe_signature(&[]), "()");
    }
}
