//! Runtime values and object instances

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::types::{builtin, PrimitiveKind, TypeHandle};

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique object ID
fn generate_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A runtime value as seen by reflective calls
///
/// Primitive variants behave as their boxed wrapper when a runtime type is
/// asked for, since reflective call arguments are always boxed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null reference
    Null,
    /// `boolean`
    Bool(bool),
    /// `char`
    Char(char),
    /// `byte`
    Byte(i8),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// String instance
    Str(Arc<str>),
    /// Any other object instance
    Object(ObjectRef),
}

impl Value {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a string value
    #[inline]
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Zero value for a declared type: primitive zero, else null
    pub fn default_for(ty: &TypeHandle) -> Self {
        match ty.primitive_kind() {
            Some(PrimitiveKind::Int) => Value::Int(0),
            Some(PrimitiveKind::Long) => Value::Long(0),
            Some(PrimitiveKind::Char) => Value::Char('\0'),
            Some(PrimitiveKind::Float) => Value::Float(0.0),
            Some(PrimitiveKind::Double) => Value::Double(0.0),
            Some(PrimitiveKind::Boolean) => Value::Bool(false),
            Some(PrimitiveKind::Byte) => Value::Byte(0),
            Some(PrimitiveKind::Short) => Value::Short(0),
            None => Value::Null,
        }
    }

    // ========================================================================
    // Type information
    // ========================================================================

    /// Whether this is the null reference
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive kind of a primitive variant
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Bool(_) => Some(PrimitiveKind::Boolean),
            Value::Char(_) => Some(PrimitiveKind::Char),
            Value::Byte(_) => Some(PrimitiveKind::Byte),
            Value::Short(_) => Some(PrimitiveKind::Short),
            Value::Int(_) => Some(PrimitiveKind::Int),
            Value::Long(_) => Some(PrimitiveKind::Long),
            Value::Float(_) => Some(PrimitiveKind::Float),
            Value::Double(_) => Some(PrimitiveKind::Double),
            _ => None,
        }
    }

    /// Runtime type of the value; `None` for null
    ///
    /// Primitives report their wrapper type.
    pub fn runtime_type(&self) -> Option<TypeHandle> {
        match self {
            Value::Null => None,
            Value::Str(_) => Some(builtin::string()),
            Value::Object(obj) => Some(obj.type_handle().clone()),
            primitive => primitive.primitive_kind().map(builtin::wrapper),
        }
    }

    /// Convert to another primitive kind by a widening conversion
    ///
    /// Returns `None` when the conversion would narrow or change category.
    pub fn widen_to(&self, target: PrimitiveKind) -> Option<Value> {
        use PrimitiveKind as K;

        if self.primitive_kind() == Some(target) {
            return Some(self.clone());
        }
        let widened = match (self, target) {
            (Value::Byte(v), K::Short) => Value::Short(*v as i16),
            (Value::Byte(v), K::Int) => Value::Int(*v as i32),
            (Value::Byte(v), K::Long) => Value::Long(*v as i64),
            (Value::Byte(v), K::Float) => Value::Float(*v as f32),
            (Value::Byte(v), K::Double) => Value::Double(*v as f64),
            (Value::Short(v), K::Int) => Value::Int(*v as i32),
            (Value::Short(v), K::Long) => Value::Long(*v as i64),
            (Value::Short(v), K::Float) => Value::Float(*v as f32),
            (Value::Short(v), K::Double) => Value::Double(*v as f64),
            (Value::Char(v), K::Int) => Value::Int(*v as i32),
            (Value::Char(v), K::Long) => Value::Long(*v as i64),
            (Value::Char(v), K::Float) => Value::Float(*v as u32 as f32),
            (Value::Char(v), K::Double) => Value::Double(*v as u32 as f64),
            (Value::Int(v), K::Long) => Value::Long(*v as i64),
            (Value::Int(v), K::Float) => Value::Float(*v as f32),
            (Value::Int(v), K::Double) => Value::Double(*v as f64),
            (Value::Long(v), K::Float) => Value::Float(*v as f32),
            (Value::Long(v), K::Double) => Value::Double(*v as f64),
            (Value::Float(v), K::Double) => Value::Double(*v as f64),
            _ => return None,
        };
        Some(widened)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32, widening byte/short/char
    pub fn as_int(&self) -> Option<i32> {
        match self.widen_to(PrimitiveKind::Int)? {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Get as i64, widening smaller integers
    pub fn as_long(&self) -> Option<i64> {
        match self.widen_to(PrimitiveKind::Long)? {
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Get as f64, widening any numeric primitive
    pub fn as_double(&self) -> Option<f64> {
        match self.widen_to(PrimitiveKind::Double)? {
            Value::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    /// Get as object reference
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
            Value::Object(obj) => write!(f, "{}", obj),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::str(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

/// Heap instance: a runtime type plus field slots
///
/// Slots are keyed by declaring type and field name so that a subtype field
/// never shadows an ancestor field of the same name.
pub struct Instance {
    object_id: u64,
    ty: TypeHandle,
    slots: RwLock<FxHashMap<String, FxHashMap<String, Value>>>,
}

/// Shared reference to an [`Instance`]; equality is identity
#[derive(Clone)]
pub struct ObjectRef(Arc<Instance>);

impl ObjectRef {
    /// Allocate an instance with no slots set
    pub fn new(ty: TypeHandle) -> Self {
        ObjectRef(Arc::new(Instance {
            object_id: generate_object_id(),
            ty,
            slots: RwLock::new(FxHashMap::default()),
        }))
    }

    /// Unique object ID
    pub fn id(&self) -> u64 {
        self.0.object_id
    }

    /// Runtime type of the instance
    pub fn type_handle(&self) -> &TypeHandle {
        &self.0.ty
    }

    /// Read a slot
    pub fn get_slot(&self, declaring: &str, name: &str) -> Option<Value> {
        self.0
            .slots
            .read()
            .get(declaring)
            .and_then(|fields| fields.get(name))
            .cloned()
    }

    /// Write a slot, returning the previous value
    pub fn set_slot(&self, declaring: &str, name: &str, value: Value) -> Option<Value> {
        self.0
            .slots
            .write()
            .entry(declaring.to_string())
            .or_default()
            .insert(name.to_string(), value)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({}@{})", self.0.ty.name(), self.0.object_id)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.0.ty.simple_name(), self.0.object_id)
    }
}
