//! Debuggee inspection façade for Nova's evaluator.
//!
//! `nova-eval` consumes this crate to look at a suspended JVM thread: the
//! visible locals of a frame, the receiver, argument values, object fields,
//! and remote method invocation. Everything goes through the synchronous
//! [`JdwpClient`] trait so the evaluator can be exercised against
//! [`MockJdwpClient`] without a JVM.

mod mock;
pub mod signature;

use thiserror::Error;

pub use mock::{MockClass, MockFrame, MockJdwpClient, MockObject};
pub use signature::{JvmType, MethodDescriptor, PrimitiveType};

pub type ThreadId = u64;
pub type FrameId = u64;
pub type ObjectId = u64;

#[derive(Clone, Debug, PartialEq)]
pub enum JdwpValue {
    Null,
    Void,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Object(ObjectRef),
}

impl JdwpValue {
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Object(obj) => Some(obj.id),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Java spelling of the runtime type (`int`, `java.lang.String`, ...).
    ///
    /// `null` has no runtime type, mirroring JDI where `Value.type()` is
    /// unavailable for a null reference.
    pub fn type_name(&self) -> Option<&str> {
        Some(match self {
            Self::Null | Self::Void => return None,
            Self::Boolean(_) => "boolean",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Char(_) => "char",
            Self::Object(obj) => obj.runtime_type.as_str(),
        })
    }
}

impl From<ObjectRef> for JdwpValue {
    fn from(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub id: ObjectId,
    pub runtime_type: String,
}

impl ObjectRef {
    pub fn new(id: ObjectId, runtime_type: impl Into<String>) -> Self {
        Self {
            id,
            runtime_type: runtime_type.into(),
        }
    }
}

/// A local variable visible at the current location of a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalVariable {
    pub name: String,
    /// Declared type. `None` when the class has not been loaded by the target VM yet.
    pub type_name: Option<String>,
    /// Slot in the method's variable table. Later declarations use higher slots.
    pub slot: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub type_name: String,
    pub declaring_type: String,
    pub is_static: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    /// JVM method descriptor, e.g. `(Ljava/lang/Object;)Ljava/lang/Object;`.
    pub signature: String,
    pub declaring_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub declaring_type: String,
    pub method: MethodInfo,
    pub line: u32,
}

#[derive(Debug, Error)]
pub enum JdwpError {
    #[error("JDWP client is not connected")]
    NotConnected,
    #[error("JDWP operation not implemented")]
    NotImplemented,
    #[error("JDWP protocol error: {0}")]
    Protocol(String),
    #[error("JDWP command failed with error code {error_code}")]
    CommandFailed { error_code: u16 },
    #[error("invalid object id {0}")]
    InvalidObjectId(ObjectId),
    #[error("invalid frame id {0}")]
    InvalidFrameId(FrameId),
    #[error("method invocation threw {}", exception.runtime_type)]
    InvocationException { exception: ObjectRef },
    #[error("{0}")]
    Other(String),
}

/// Mock-friendly interface for inspecting a suspended debuggee.
///
/// All calls are blocking round-trips to a stopped VM that is shared by the
/// whole debug session, so callers must serialize access (the `&mut self`
/// receivers make that explicit).
pub trait JdwpClient: Send {
    /// Locals visible at the frame's current location, in declaration order.
    fn visible_variables(&mut self, frame: FrameId) -> Result<Vec<LocalVariable>, JdwpError>;
    fn local_value(
        &mut self,
        frame: FrameId,
        variable: &LocalVariable,
    ) -> Result<JdwpValue, JdwpError>;
    fn set_local_value(
        &mut self,
        frame: FrameId,
        variable: &LocalVariable,
        value: JdwpValue,
    ) -> Result<(), JdwpError>;

    fn this_object(&mut self, frame: FrameId) -> Result<Option<ObjectRef>, JdwpError>;
    fn argument_values(&mut self, frame: FrameId) -> Result<Vec<JdwpValue>, JdwpError>;
    fn frame_location(&mut self, frame: FrameId) -> Result<Option<Location>, JdwpError>;

    /// Fields declared directly by `type_name` (inherited fields are not included).
    fn fields(&mut self, type_name: &str) -> Result<Vec<FieldInfo>, JdwpError>;
    fn field_value(&mut self, object: &ObjectRef, field: &FieldInfo)
        -> Result<JdwpValue, JdwpError>;
    fn static_field_value(
        &mut self,
        type_name: &str,
        field: &FieldInfo,
    ) -> Result<JdwpValue, JdwpError>;
    fn set_field_value(
        &mut self,
        object: &ObjectRef,
        field: &FieldInfo,
        value: JdwpValue,
    ) -> Result<(), JdwpError>;

    /// Superclass chain followed by every implemented interface (transitively).
    fn supertypes(&mut self, type_name: &str) -> Result<Vec<String>, JdwpError>;

    /// Methods visible on `type_name` (declared or inherited) matching name and descriptor.
    fn methods_by_name(
        &mut self,
        type_name: &str,
        name: &str,
        signature: &str,
    ) -> Result<Vec<MethodInfo>, JdwpError>;

    fn invoke_method(
        &mut self,
        thread: ThreadId,
        object: &ObjectRef,
        method: &MethodInfo,
        args: &[JdwpValue],
    ) -> Result<JdwpValue, JdwpError>;
    fn invoke_static_method(
        &mut self,
        thread: ThreadId,
        type_name: &str,
        method: &MethodInfo,
        args: &[JdwpValue],
    ) -> Result<JdwpValue, JdwpError>;
    fn new_instance(
        &mut self,
        thread: ThreadId,
        type_name: &str,
        constructor_signature: &str,
        args: &[JdwpValue],
    ) -> Result<ObjectRef, JdwpError>;

    /// Field lookup including inherited fields (JDI's `ReferenceType.fieldByName`).
    fn field_by_name(
        &mut self,
        type_name: &str,
        name: &str,
    ) -> Result<Option<FieldInfo>, JdwpError> {
        if let Some(field) = self.fields(type_name)?.into_iter().find(|f| f.name == name) {
            return Ok(Some(field));
        }
        for supertype in self.supertypes(type_name)? {
            if let Some(field) = self.fields(&supertype)?.into_iter().find(|f| f.name == name) {
                return Ok(Some(field));
            }
        }
        Ok(None)
    }

    fn is_subtype(&mut self, type_name: &str, supertype: &str) -> Result<bool, JdwpError> {
        if type_name == supertype {
            return Ok(true);
        }
        Ok(self.supertypes(type_name)?.iter().any(|t| t == supertype))
    }
}
