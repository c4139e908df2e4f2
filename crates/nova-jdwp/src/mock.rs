use std::collections::{BTreeSet, HashMap};

use crate::{
    FieldInfo, FrameId, JdwpClient, JdwpError, JdwpValue, JvmType, LocalVariable, Location,
    MethodInfo, ObjectId, ObjectRef, PrimitiveType, ThreadId,
};

const OBJECT: &str = JvmType::OBJECT_TYPE_NAME;

/// Kotlin's `Ref` holders for captured mutable locals, keyed by element type.
const KOTLIN_REF_CLASSES: &[(&str, &str)] = &[
    ("kotlin.jvm.internal.Ref$ObjectRef", OBJECT),
    ("kotlin.jvm.internal.Ref$BooleanRef", "boolean"),
    ("kotlin.jvm.internal.Ref$ByteRef", "byte"),
    ("kotlin.jvm.internal.Ref$CharRef", "char"),
    ("kotlin.jvm.internal.Ref$ShortRef", "short"),
    ("kotlin.jvm.internal.Ref$IntRef", "int"),
    ("kotlin.jvm.internal.Ref$LongRef", "long"),
    ("kotlin.jvm.internal.Ref$FloatRef", "float"),
    ("kotlin.jvm.internal.Ref$DoubleRef", "double"),
];

#[derive(Clone, Debug, Default)]
pub struct MockFrame {
    pub variables: Vec<(LocalVariable, JdwpValue)>,
    pub this_object: Option<ObjectRef>,
    pub arguments: Vec<JdwpValue>,
    pub location: Option<Location>,
}

impl MockFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local(self, name: &str, type_name: &str, value: JdwpValue) -> Self {
        self.push_local(name, Some(type_name.to_string()), value)
    }

    /// A local whose declared class is not loaded in the target VM.
    pub fn with_unloaded_local(self, name: &str, value: JdwpValue) -> Self {
        self.push_local(name, None, value)
    }

    fn push_local(mut self, name: &str, type_name: Option<String>, value: JdwpValue) -> Self {
        let slot = u32::try_from(self.variables.len()).expect("mock frame slot fits in u32");
        self.variables.push((
            LocalVariable {
                name: name.to_string(),
                type_name,
                slot,
            },
            value,
        ));
        self
    }

    pub fn with_this(mut self, this: ObjectRef) -> Self {
        self.this_object = Some(this);
        self
    }

    pub fn with_argument(mut self, value: JdwpValue) -> Self {
        self.arguments.push(value);
        self
    }

    pub fn at(mut self, declaring_type: &str, method: &str, signature: &str) -> Self {
        self.location = Some(Location {
            declaring_type: declaring_type.to_string(),
            method: MethodInfo {
                name: method.to_string(),
                signature: signature.to_string(),
                declaring_type: declaring_type.to_string(),
            },
            line: 1,
        });
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockClass {
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<(String, String, bool)>,
    pub static_values: HashMap<String, JdwpValue>,
    pub methods: Vec<(String, String)>,
}

impl MockClass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn with_field(mut self, name: &str, type_name: &str) -> Self {
        self.fields
            .push((name.to_string(), type_name.to_string(), false));
        self
    }

    pub fn with_static_field(mut self, name: &str, type_name: &str, value: JdwpValue) -> Self {
        self.fields.push((name.to_string(), type_name.to_string(), true));
        self.static_values.insert(name.to_string(), value);
        self
    }

    pub fn with_method(mut self, name: &str, signature: &str) -> Self {
        self.methods.push((name.to_string(), signature.to_string()));
        self
    }
}

#[derive(Clone, Debug)]
pub struct MockObject {
    pub runtime_type: String,
    pub fields: HashMap<String, JdwpValue>,
}

#[derive(Clone, Debug)]
enum MockInvocation {
    Returns(JdwpValue),
    Throws(ObjectRef),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum InvocationTarget {
    Object(ObjectId),
    Type(String),
}

/// Deterministic, in-memory debuggee.
///
/// The bootstrap classes the evaluator relies on (`java.lang.Object`, the
/// primitive wrappers and Kotlin's `Ref` holders) are pre-registered.
pub struct MockJdwpClient {
    frames: HashMap<FrameId, MockFrame>,
    classes: HashMap<String, MockClass>,
    objects: HashMap<ObjectId, MockObject>,
    invocations: HashMap<(InvocationTarget, String, String), MockInvocation>,
    next_object_id: ObjectId,
    connected: bool,
    pub invoke_method_calls: Vec<(ObjectId, String)>,
    pub set_local_calls: Vec<(FrameId, String, JdwpValue)>,
}

impl Default for MockJdwpClient {
    fn default() -> Self {
        let mut client = Self {
            frames: HashMap::new(),
            classes: HashMap::new(),
            objects: HashMap::new(),
            invocations: HashMap::new(),
            next_object_id: 1000,
            connected: true,
            invoke_method_calls: Vec::new(),
            set_local_calls: Vec::new(),
        };
        client.define_class(OBJECT, MockClass::new());
        for primitive in [
            PrimitiveType::Boolean,
            PrimitiveType::Byte,
            PrimitiveType::Char,
            PrimitiveType::Short,
            PrimitiveType::Int,
            PrimitiveType::Long,
            PrimitiveType::Float,
            PrimitiveType::Double,
        ] {
            let boxed = primitive.boxed_type_name();
            let value_of = format!(
                "({}){}",
                primitive.tag(),
                JvmType::object(boxed).descriptor()
            );
            client.define_class(
                boxed,
                MockClass::new()
                    .with_field("value", primitive.keyword())
                    .with_method("valueOf", &value_of),
            );
        }
        for (ref_class, element) in KOTLIN_REF_CLASSES {
            client.define_class(
                ref_class,
                MockClass::new()
                    .with_field("element", element)
                    .with_method("<init>", "()V"),
            );
        }
        client
    }
}

impl MockJdwpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_class(&mut self, type_name: &str, class: MockClass) {
        self.classes.insert(type_name.to_string(), class);
    }

    pub fn insert_frame(&mut self, frame_id: FrameId, frame: MockFrame) {
        self.frames.insert(frame_id, frame);
    }

    pub fn frame(&self, frame_id: FrameId) -> Option<&MockFrame> {
        self.frames.get(&frame_id)
    }

    pub fn insert_object(&mut self, object_id: ObjectId, obj: MockObject) {
        self.objects.insert(object_id, obj);
    }

    pub fn object_state(&self, object_id: ObjectId) -> Option<&MockObject> {
        self.objects.get(&object_id)
    }

    /// Allocates an object, declaring any of its fields that the class does not know yet.
    ///
    /// Fields are `(name, type_name, value)` and keep their declaration order.
    pub fn object(&mut self, type_name: &str, fields: Vec<(&str, &str, JdwpValue)>) -> ObjectRef {
        let class = self.classes.entry(type_name.to_string()).or_default();
        for (name, field_type, _) in &fields {
            if !class.fields.iter().any(|(n, _, _)| n == name) {
                class
                    .fields
                    .push((name.to_string(), field_type.to_string(), false));
            }
        }

        let id = self.allocate_id();
        self.objects.insert(
            id,
            MockObject {
                runtime_type: type_name.to_string(),
                fields: fields
                    .into_iter()
                    .map(|(name, _, value)| (name.to_string(), value))
                    .collect(),
            },
        );
        ObjectRef::new(id, type_name)
    }

    pub fn set_invocation_result(
        &mut self,
        object_id: ObjectId,
        method: &str,
        signature: &str,
        result: JdwpValue,
    ) {
        self.invocations.insert(
            (
                InvocationTarget::Object(object_id),
                method.to_string(),
                signature.to_string(),
            ),
            MockInvocation::Returns(result),
        );
    }

    pub fn set_invocation_exception(
        &mut self,
        object_id: ObjectId,
        method: &str,
        signature: &str,
        exception: ObjectRef,
    ) {
        self.invocations.insert(
            (
                InvocationTarget::Object(object_id),
                method.to_string(),
                signature.to_string(),
            ),
            MockInvocation::Throws(exception),
        );
    }

    pub fn set_static_invocation_result(
        &mut self,
        type_name: &str,
        method: &str,
        signature: &str,
        result: JdwpValue,
    ) {
        self.invocations.insert(
            (
                InvocationTarget::Type(type_name.to_string()),
                method.to_string(),
                signature.to_string(),
            ),
            MockInvocation::Returns(result),
        );
    }

    /// Simulates the debuggee going away: every later call fails with `NotConnected`.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    fn ensure_connected(&self) -> Result<(), JdwpError> {
        if self.connected {
            Ok(())
        } else {
            Err(JdwpError::NotConnected)
        }
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = self.next_object_id;
        self.next_object_id += 1;
        id
    }

    fn frame_ref(&self, frame: FrameId) -> Result<&MockFrame, JdwpError> {
        self.ensure_connected()?;
        self.frames.get(&frame).ok_or(JdwpError::InvalidFrameId(frame))
    }

    fn object_ref(&self, object_id: ObjectId) -> Result<&MockObject, JdwpError> {
        self.ensure_connected()?;
        self.objects
            .get(&object_id)
            .ok_or(JdwpError::InvalidObjectId(object_id))
    }

    fn type_declares_method(&self, type_name: &str, name: &str, signature: &str) -> bool {
        self.classes.get(type_name).is_some_and(|class| {
            class
                .methods
                .iter()
                .any(|(n, s)| n == name && s == signature)
        })
    }

    fn collect_supertypes(&self, type_name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = type_name.to_string();
        while let Some(superclass) = self
            .classes
            .get(&current)
            .and_then(|class| class.superclass.clone())
        {
            if !seen.insert(superclass.clone()) {
                break;
            }
            chain.push(superclass.clone());
            current = superclass;
        }
        if type_name != OBJECT && !seen.contains(OBJECT) {
            seen.insert(OBJECT.to_string());
            chain.push(OBJECT.to_string());
        }

        let mut pending: Vec<String> = std::iter::once(type_name.to_string())
            .chain(chain.iter().cloned())
            .collect();
        let mut interfaces = Vec::new();
        while let Some(next) = pending.pop() {
            let Some(class) = self.classes.get(&next) else {
                continue;
            };
            for interface in class.interfaces.iter().rev() {
                if seen.insert(interface.clone()) {
                    interfaces.push(interface.clone());
                    pending.push(interface.clone());
                }
            }
        }

        chain.extend(interfaces);
        chain
    }

    fn default_value(type_name: &str) -> JdwpValue {
        match PrimitiveType::from_keyword(type_name) {
            Some(PrimitiveType::Boolean) => JdwpValue::Boolean(false),
            Some(PrimitiveType::Byte) => JdwpValue::Byte(0),
            Some(PrimitiveType::Char) => JdwpValue::Char('\0'),
            Some(PrimitiveType::Short) => JdwpValue::Short(0),
            Some(PrimitiveType::Int) => JdwpValue::Int(0),
            Some(PrimitiveType::Long) => JdwpValue::Long(0),
            Some(PrimitiveType::Float) => JdwpValue::Float(0.0),
            Some(PrimitiveType::Double) => JdwpValue::Double(0.0),
            None => JdwpValue::Null,
        }
    }

    fn lookup_invocation(
        &mut self,
        target: InvocationTarget,
        method: &MethodInfo,
    ) -> Option<Result<JdwpValue, JdwpError>> {
        let key = (target, method.name.clone(), method.signature.clone());
        self.invocations.get(&key).map(|invocation| match invocation {
            MockInvocation::Returns(value) => Ok(value.clone()),
            MockInvocation::Throws(exception) => Err(JdwpError::InvocationException {
                exception: exception.clone(),
            }),
        })
    }
}

impl JdwpClient for MockJdwpClient {
    fn visible_variables(&mut self, frame: FrameId) -> Result<Vec<LocalVariable>, JdwpError> {
        Ok(self
            .frame_ref(frame)?
            .variables
            .iter()
            .map(|(variable, _)| variable.clone())
            .collect())
    }

    fn local_value(
        &mut self,
        frame: FrameId,
        variable: &LocalVariable,
    ) -> Result<JdwpValue, JdwpError> {
        self.frame_ref(frame)?
            .variables
            .iter()
            .find(|(v, _)| v.slot == variable.slot && v.name == variable.name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                JdwpError::Other(format!("variable `{}` is not visible", variable.name))
            })
    }

    fn set_local_value(
        &mut self,
        frame: FrameId,
        variable: &LocalVariable,
        value: JdwpValue,
    ) -> Result<(), JdwpError> {
        self.ensure_connected()?;
        let slot = self
            .frames
            .get_mut(&frame)
            .ok_or(JdwpError::InvalidFrameId(frame))?
            .variables
            .iter_mut()
            .find(|(v, _)| v.slot == variable.slot && v.name == variable.name)
            .ok_or_else(|| {
                JdwpError::Other(format!("variable `{}` is not visible", variable.name))
            })?;
        slot.1 = value.clone();
        self.set_local_calls
            .push((frame, variable.name.clone(), value));
        Ok(())
    }

    fn this_object(&mut self, frame: FrameId) -> Result<Option<ObjectRef>, JdwpError> {
        Ok(self.frame_ref(frame)?.this_object.clone())
    }

    fn argument_values(&mut self, frame: FrameId) -> Result<Vec<JdwpValue>, JdwpError> {
        Ok(self.frame_ref(frame)?.arguments.clone())
    }

    fn frame_location(&mut self, frame: FrameId) -> Result<Option<Location>, JdwpError> {
        Ok(self.frame_ref(frame)?.location.clone())
    }

    fn fields(&mut self, type_name: &str) -> Result<Vec<FieldInfo>, JdwpError> {
        self.ensure_connected()?;
        Ok(self
            .classes
            .get(type_name)
            .map(|class| {
                class
                    .fields
                    .iter()
                    .map(|(name, field_type, is_static)| FieldInfo {
                        name: name.clone(),
                        type_name: field_type.clone(),
                        declaring_type: type_name.to_string(),
                        is_static: *is_static,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn field_value(
        &mut self,
        object: &ObjectRef,
        field: &FieldInfo,
    ) -> Result<JdwpValue, JdwpError> {
        Ok(self
            .object_ref(object.id)?
            .fields
            .get(&field.name)
            .cloned()
            .unwrap_or_else(|| Self::default_value(&field.type_name)))
    }

    fn static_field_value(
        &mut self,
        type_name: &str,
        field: &FieldInfo,
    ) -> Result<JdwpValue, JdwpError> {
        self.ensure_connected()?;
        Ok(self
            .classes
            .get(type_name)
            .and_then(|class| class.static_values.get(&field.name))
            .cloned()
            .unwrap_or_else(|| Self::default_value(&field.type_name)))
    }

    fn set_field_value(
        &mut self,
        object: &ObjectRef,
        field: &FieldInfo,
        value: JdwpValue,
    ) -> Result<(), JdwpError> {
        self.ensure_connected()?;
        self.objects
            .get_mut(&object.id)
            .ok_or(JdwpError::InvalidObjectId(object.id))?
            .fields
            .insert(field.name.clone(), value);
        Ok(())
    }

    fn supertypes(&mut self, type_name: &str) -> Result<Vec<String>, JdwpError> {
        self.ensure_connected()?;
        Ok(self.collect_supertypes(type_name))
    }

    fn methods_by_name(
        &mut self,
        type_name: &str,
        name: &str,
        signature: &str,
    ) -> Result<Vec<MethodInfo>, JdwpError> {
        self.ensure_connected()?;
        let candidates =
            std::iter::once(type_name.to_string()).chain(self.collect_supertypes(type_name));
        Ok(candidates
            .filter(|declaring| self.type_declares_method(declaring, name, signature))
            .map(|declaring_type| MethodInfo {
                name: name.to_string(),
                signature: signature.to_string(),
                declaring_type,
            })
            .collect())
    }

    fn invoke_method(
        &mut self,
        _thread: ThreadId,
        object: &ObjectRef,
        method: &MethodInfo,
        _args: &[JdwpValue],
    ) -> Result<JdwpValue, JdwpError> {
        self.object_ref(object.id)?;
        self.invoke_method_calls
            .push((object.id, method.name.clone()));
        match self.lookup_invocation(InvocationTarget::Object(object.id), method) {
            Some(result) => result,
            None => Err(JdwpError::Other(format!(
                "no mock invocation result configured for `{}` on object {}",
                method.name, object.id
            ))),
        }
    }

    fn invoke_static_method(
        &mut self,
        _thread: ThreadId,
        type_name: &str,
        method: &MethodInfo,
        args: &[JdwpValue],
    ) -> Result<JdwpValue, JdwpError> {
        self.ensure_connected()?;
        if let Some(result) =
            self.lookup_invocation(InvocationTarget::Type(type_name.to_string()), method)
        {
            return result;
        }

        // Primitive wrappers box through `valueOf` like the real JDK.
        if method.name == "valueOf" && PrimitiveType::from_boxed_type_name(type_name).is_some() {
            if let [value] = args {
                let boxed = self.object(type_name, vec![("value", "", value.clone())]);
                return Ok(JdwpValue::Object(boxed));
            }
        }

        Err(JdwpError::Other(format!(
            "no mock invocation result configured for `{type_name}.{}`",
            method.name
        )))
    }

    fn new_instance(
        &mut self,
        _thread: ThreadId,
        type_name: &str,
        constructor_signature: &str,
        _args: &[JdwpValue],
    ) -> Result<ObjectRef, JdwpError> {
        self.ensure_connected()?;
        if !self.type_declares_method(type_name, "<init>", constructor_signature) {
            return Err(JdwpError::Other(format!(
                "`{type_name}` has no constructor `{constructor_signature}`"
            )));
        }
        let fields = self
            .classes
            .get(type_name)
            .map(|class| {
                class
                    .fields
                    .iter()
                    .filter(|(_, _, is_static)| !is_static)
                    .map(|(name, field_type, _)| (name.clone(), Self::default_value(field_type)))
                    .collect()
            })
            .unwrap_or_default();
        let id = self.allocate_id();
        self.objects.insert(
            id,
            MockObject {
                runtime_type: type_name.to_string(),
                fields,
            },
        );
        Ok(ObjectRef::new(id, type_name))
    }
}
