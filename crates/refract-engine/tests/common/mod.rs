//! Shared fixture: a three-level class hierarchy
//!
//! ```text
//! zoo.Animal            name, legs, KINGDOM (static final)
//!   zoo.Mammal          furry, cache (transient)
//!     zoo.Dog           MAX (static), breed, tricks (volatile), LICENSE (static final)
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use refract_engine::{ClassBuilder, ClassRegistry, ConstructorDef, FieldDef, MethodDef, Reflector};
use refract_sdk::{ObjectRef, ReflectRuntime, TypeHandle, Value};

pub struct Zoo {
    pub registry: Arc<ClassRegistry>,
    pub animal: TypeHandle,
    pub mammal: TypeHandle,
    pub dog: TypeHandle,
    pub internal: TypeHandle,
    pub audited: TypeHandle,
}

impl Zoo {
    pub fn runtime(&self) -> &dyn ReflectRuntime {
        &*self.registry
    }

    pub fn reflector(&self) -> Reflector {
        Reflector::for_registry(self.registry.clone())
    }
}

/// Record which constructor ran
fn mark(obj: &ObjectRef, which: &str) {
    obj.set_slot("zoo.Dog", "ctor", Value::str(which));
}

pub fn constructor_used(obj: &ObjectRef) -> Option<String> {
    obj.get_slot("zoo.Dog", "ctor")
        .and_then(|v| v.as_str().map(str::to_string))
}

pub fn zoo() -> Zoo {
    let registry = Arc::new(ClassRegistry::new());

    let internal = registry.define(ClassBuilder::annotation("zoo.Internal")).unwrap();
    let audited = registry.define(ClassBuilder::annotation("zoo.Audited")).unwrap();
    registry.define(ClassBuilder::interface("zoo.Pet")).unwrap();

    let animal = registry
        .define(
            ClassBuilder::new("zoo.Animal")
                .add_field(FieldDef::new("name", "String").protected())
                .add_field(FieldDef::new("legs", "int").private().initial_value(Value::Int(4)))
                .add_field(
                    FieldDef::new("KINGDOM", "String")
                        .public()
                        .as_static()
                        .as_final()
                        .initial_value(Value::str("Animalia")),
                )
                .add_constructor(ConstructorDef::new().public())
                .add_constructor(ConstructorDef::new().public().with_param("String").body(|obj, args| {
                    obj.set_slot("zoo.Animal", "name", args[0].clone());
                    Ok(())
                }))
                .add_method(
                    MethodDef::new("speak")
                        .public()
                        .returns("String")
                        .body(|_, _| Ok(Value::str("..."))),
                )
                .add_method(
                    MethodDef::new("describe")
                        .public()
                        .returns("String")
                        .body(|recv, _| {
                            let recv = recv.ok_or("no receiver")?;
                            let name = recv.get_slot("zoo.Animal", "name").unwrap_or(Value::Null);
                            Ok(Value::str(format!("animal {}", name)))
                        }),
                ),
        )
        .unwrap();

    let mammal = registry
        .define(
            ClassBuilder::new("zoo.Mammal")
                .extends("zoo.Animal")
                .add_field(FieldDef::new("furry", "boolean").public().initial_value(Value::Bool(true)))
                .add_field(FieldDef::new("cache", "Object").private().as_transient())
                .add_method(
                    MethodDef::new("nurse")
                        .protected()
                        .annotated("zoo.Audited")
                        .body(|_, _| Ok(Value::Null)),
                ),
        )
        .unwrap();

    let dog = registry
        .define(
            ClassBuilder::new("zoo.Dog")
                .extends("zoo.Mammal")
                .implements("zoo.Pet")
                .add_field(FieldDef::new("MAX", "int").public().as_static().initial_value(Value::Int(12)))
                .add_field(FieldDef::new("breed", "String").public())
                .add_field(FieldDef::new("tricks", "int").private().as_volatile())
                .add_field(FieldDef::new("LICENSE", "long").private().as_static().as_final())
                .add_constructor(
                    ConstructorDef::new()
                        .public()
                        .annotated("zoo.Internal")
                        .with_param("int")
                        .body(|obj, _| {
                            mark(obj, "int");
                            Ok(())
                        }),
                )
                .add_constructor(ConstructorDef::new().public().with_param("Integer").body(|obj, _| {
                    mark(obj, "Integer");
                    Ok(())
                }))
                .add_constructor(ConstructorDef::new().public().with_param("String").body(|obj, args| {
                    mark(obj, "String");
                    obj.set_slot("zoo.Dog", "breed", args[0].clone());
                    Ok(())
                }))
                .add_constructor(ConstructorDef::new().private().with_param("double").body(|obj, _| {
                    mark(obj, "double");
                    Ok(())
                }))
                .add_method(
                    MethodDef::new("speak")
                        .public()
                        .returns("String")
                        .body(|_, _| Ok(Value::str("Woof"))),
                )
                .add_method(
                    MethodDef::new("add")
                        .public()
                        .with_param("int")
                        .with_param("int")
                        .returns("int")
                        .body(|_, args| {
                            let a = args[0].as_int().ok_or("bad argument")?;
                            let b = args[1].as_int().ok_or("bad argument")?;
                            Ok(Value::Int(a + b))
                        }),
                )
                .add_method(
                    MethodDef::new("learn")
                        .private()
                        .with_param("int")
                        .returns("int")
                        .body(|recv, args| {
                            let recv = recv.ok_or("no receiver")?;
                            let current = recv.get_slot("zoo.Dog", "tricks").and_then(|v| v.as_int()).unwrap_or(0);
                            let next = current + args[0].as_int().unwrap_or(0);
                            recv.set_slot("zoo.Dog", "tricks", Value::Int(next));
                            Ok(Value::Int(next))
                        }),
                )
                .add_method(
                    MethodDef::new("fail")
                        .public()
                        .body(|_, _| Err("the dog refused".to_string())),
                )
                .add_method(
                    MethodDef::new("bark")
                        .public()
                        .as_static()
                        .with_param("String")
                        .returns("String")
                        .body(|recv, args| {
                            if recv.is_some() {
                                return Err("static method received a receiver".to_string());
                            }
                            Ok(Value::str(format!("{}!", args[0])))
                        }),
                ),
        )
        .unwrap();

    Zoo {
        registry,
        animal,
        mammal,
        dog,
        internal,
        audited,
    }
}
