//! Matching debuggee values against the types a compiled fragment expects.

use nova_jdwp::{JdwpClient, JdwpError, JdwpValue, JvmType, ObjectRef, PrimitiveType, ThreadId};

pub const REF_TYPE_PREFIX: &str = "kotlin.jvm.internal.Ref$";
const OBJECT_REF_TYPE: &str = "kotlin.jvm.internal.Ref$ObjectRef";
pub(crate) const REF_ELEMENT_FIELD: &str = "element";
const BOX_VALUE_FIELD: &str = "value";

/// How a value was adapted to the expected type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boxing {
    None,
    Boxed,
    Unboxed,
    /// Wrapped into a fresh Kotlin `Ref` holder.
    RefWrapped,
    /// Read out of a Kotlin `Ref` holder.
    RefUnwrapped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoercedValue {
    pub value: JdwpValue,
    pub boxing: Boxing,
}

impl CoercedValue {
    fn unchanged(value: JdwpValue) -> Self {
        Self {
            value,
            boxing: Boxing::None,
        }
    }
}

/// Decides type compatibility and performs boxing and `Ref` conversions.
pub trait ValueConverter {
    /// `actual` is `None` for `null` values and for types the VM has not loaded.
    fn type_matches<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
        expected: &JvmType,
        actual: Option<&str>,
    ) -> Result<bool, JdwpError>;

    fn coerce<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
        thread: ThreadId,
        value: JdwpValue,
        expected: &JvmType,
    ) -> Result<Option<CoercedValue>, JdwpError>;
}

pub fn is_ref_type_name(type_name: &str) -> bool {
    type_name.starts_with(REF_TYPE_PREFIX)
}

/// Whether `value` is a Kotlin `Ref` holder instance.
pub fn is_ref_type(value: &JdwpValue) -> bool {
    value
        .as_object()
        .is_some_and(|obj| is_ref_type_name(&obj.runtime_type))
}

fn ref_type_for_primitive(primitive: PrimitiveType) -> &'static str {
    match primitive {
        PrimitiveType::Boolean => "kotlin.jvm.internal.Ref$BooleanRef",
        PrimitiveType::Byte => "kotlin.jvm.internal.Ref$ByteRef",
        PrimitiveType::Char => "kotlin.jvm.internal.Ref$CharRef",
        PrimitiveType::Short => "kotlin.jvm.internal.Ref$ShortRef",
        PrimitiveType::Int => "kotlin.jvm.internal.Ref$IntRef",
        PrimitiveType::Long => "kotlin.jvm.internal.Ref$LongRef",
        PrimitiveType::Float => "kotlin.jvm.internal.Ref$FloatRef",
        PrimitiveType::Double => "kotlin.jvm.internal.Ref$DoubleRef",
    }
}

/// Element type of a `Ref` holder: `Some(None)` for `ObjectRef`, `Some(Some(p))`
/// for primitive holders, `None` when `type_name` is not a holder.
fn ref_element(type_name: &str) -> Option<Option<PrimitiveType>> {
    if type_name == OBJECT_REF_TYPE {
        return Some(None);
    }
    let name = type_name.strip_prefix(REF_TYPE_PREFIX)?.strip_suffix("Ref")?;
    PrimitiveType::from_keyword(&name.to_ascii_lowercase()).map(Some)
}

/// The converter used by Nova's evaluator.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvaluatorValueConverter;

impl EvaluatorValueConverter {
    fn reference_matches<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
        expected: &str,
        actual: &JvmType,
    ) -> Result<bool, JdwpError> {
        match actual {
            JvmType::Void => Ok(false),
            JvmType::Primitive(primitive) => {
                if ref_element(expected) == Some(Some(*primitive)) || expected == OBJECT_REF_TYPE {
                    return Ok(true);
                }
                jdwp.is_subtype(primitive.boxed_type_name(), expected)
            }
            JvmType::Array(_) => Ok(expected == OBJECT_REF_TYPE || actual.type_name() == expected),
            JvmType::Object(actual_name) => {
                if jdwp.is_subtype(actual_name, expected)? {
                    return Ok(true);
                }
                // A plain value can be wrapped when the fragment captures it by reference.
                match ref_element(expected) {
                    Some(None) => return Ok(true),
                    Some(Some(primitive)) => {
                        return Ok(actual_name == primitive.boxed_type_name());
                    }
                    None => {}
                }
                // A `Ref` holder can be unwrapped when its element fits.
                match ref_element(actual_name) {
                    Some(None) => Ok(true),
                    Some(Some(primitive)) => jdwp.is_subtype(primitive.boxed_type_name(), expected),
                    None => Ok(false),
                }
            }
        }
    }

    fn wrap_into_ref<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
        thread: ThreadId,
        holder: &str,
        element: JdwpValue,
    ) -> Result<Option<CoercedValue>, JdwpError> {
        let Some(field) = jdwp.field_by_name(holder, REF_ELEMENT_FIELD)? else {
            return Ok(None);
        };
        let wrapper = jdwp.new_instance(thread, holder, "()V", &[])?;
        jdwp.set_field_value(&wrapper, &field, element)?;
        Ok(Some(CoercedValue {
            value: JdwpValue::Object(wrapper),
            boxing: Boxing::RefWrapped,
        }))
    }

    fn read_named_field<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
        obj: &ObjectRef,
        name: &str,
    ) -> Result<Option<JdwpValue>, JdwpError> {
        match jdwp.field_by_name(&obj.runtime_type, name)? {
            Some(field) => Ok(Some(jdwp.field_value(obj, &field)?)),
            None => Ok(None),
        }
    }

    fn box_primitive<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
        thread: ThreadId,
        primitive: PrimitiveType,
        value: JdwpValue,
    ) -> Result<Option<JdwpValue>, JdwpError> {
        let boxed = primitive.boxed_type_name();
        let signature = format!(
            "({}){}",
            primitive.tag(),
            JvmType::object(boxed).descriptor()
        );
        let Some(value_of) = jdwp
            .methods_by_name(boxed, "valueOf", &signature)?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };
        Ok(Some(jdwp.invoke_static_method(
            thread,
            boxed,
            &value_of,
            &[value],
        )?))
    }
}

fn primitive_of(value: &JdwpValue) -> Option<PrimitiveType> {
    value.type_name().and_then(PrimitiveType::from_keyword)
}

impl ValueConverter for EvaluatorValueConverter {
    fn type_matches<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
        expected: &JvmType,
        actual: Option<&str>,
    ) -> Result<bool, JdwpError> {
        let Some(actual) = actual else {
            return Ok(!expected.is_primitive() && *expected != JvmType::Void);
        };
        if expected.is_java_object() {
            return Ok(actual != "void");
        }

        let actual = JvmType::from_type_name(actual);
        if actual == *expected {
            return Ok(true);
        }

        match expected {
            JvmType::Void => Ok(false),
            JvmType::Primitive(primitive) => Ok(match &actual {
                JvmType::Object(name) => {
                    name == primitive.boxed_type_name()
                        || name == ref_type_for_primitive(*primitive)
                }
                _ => false,
            }),
            JvmType::Array(_) => match &actual {
                JvmType::Object(name) => Ok(ref_element(name) == Some(None)),
                _ => Ok(false),
            },
            JvmType::Object(expected) => self.reference_matches(jdwp, expected, &actual),
        }
    }

    fn coerce<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
        thread: ThreadId,
        value: JdwpValue,
        expected: &JvmType,
    ) -> Result<Option<CoercedValue>, JdwpError> {
        if let JvmType::Object(expected_name) = expected {
            if let Some(element) = ref_element(expected_name) {
                if !is_ref_type(&value) {
                    return self.wrap_for_ref(jdwp, thread, expected_name, element, value);
                }
            }
        }

        match &value {
            JdwpValue::Void => Ok(None),
            JdwpValue::Null => {
                Ok(expected.is_reference().then(|| CoercedValue::unchanged(value.clone())))
            }
            JdwpValue::Object(obj) => {
                let obj = obj.clone();
                match expected {
                    JvmType::Void => Ok(None),
                    JvmType::Primitive(primitive) => {
                        if obj.runtime_type == primitive.boxed_type_name() {
                            let unboxed = self.read_named_field(jdwp, &obj, BOX_VALUE_FIELD)?;
                            return Ok(unboxed.map(|value| CoercedValue {
                                value,
                                boxing: Boxing::Unboxed,
                            }));
                        }
                        if obj.runtime_type == ref_type_for_primitive(*primitive) {
                            let element = self.read_named_field(jdwp, &obj, REF_ELEMENT_FIELD)?;
                            return Ok(element.map(|value| CoercedValue {
                                value,
                                boxing: Boxing::RefUnwrapped,
                            }));
                        }
                        Ok(None)
                    }
                    JvmType::Object(expected_name) => {
                        if expected.is_java_object()
                            || jdwp.is_subtype(&obj.runtime_type, expected_name)?
                        {
                            return Ok(Some(CoercedValue::unchanged(value.clone())));
                        }
                        self.unwrap_ref(jdwp, thread, &obj, expected)
                    }
                    JvmType::Array(_) => {
                        if obj.runtime_type == expected.type_name() {
                            return Ok(Some(CoercedValue::unchanged(value.clone())));
                        }
                        self.unwrap_ref(jdwp, thread, &obj, expected)
                    }
                }
            }
            primitive_value => {
                let Some(primitive) = primitive_of(primitive_value) else {
                    return Ok(None);
                };
                if expected.as_primitive() == Some(primitive) {
                    return Ok(Some(CoercedValue::unchanged(value.clone())));
                }
                let boxable = match expected {
                    JvmType::Object(expected_name) => {
                        expected.is_java_object()
                            || jdwp.is_subtype(primitive.boxed_type_name(), expected_name)?
                    }
                    _ => false,
                };
                if !boxable {
                    return Ok(None);
                }
                Ok(self
                    .box_primitive(jdwp, thread, primitive, value.clone())?
                    .map(|value| CoercedValue {
                        value,
                        boxing: Boxing::Boxed,
                    }))
            }
        }
    }
}

impl EvaluatorValueConverter {
    fn wrap_for_ref<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
        thread: ThreadId,
        holder: &str,
        element: Option<PrimitiveType>,
        value: JdwpValue,
    ) -> Result<Option<CoercedValue>, JdwpError> {
        let element_value = match element {
            // `ObjectRef` stores references; primitives are boxed first.
            None => match primitive_of(&value) {
                Some(primitive) => match self.box_primitive(jdwp, thread, primitive, value)? {
                    Some(boxed) => boxed,
                    None => return Ok(None),
                },
                None if value == JdwpValue::Void => return Ok(None),
                None => value,
            },
            Some(primitive) => {
                let target = JvmType::Primitive(primitive);
                match self.coerce(jdwp, thread, value, &target)? {
                    Some(coerced) => coerced.value,
                    None => return Ok(None),
                }
            }
        };
        self.wrap_into_ref(jdwp, thread, holder, element_value)
    }

    fn unwrap_ref<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
        thread: ThreadId,
        obj: &ObjectRef,
        expected: &JvmType,
    ) -> Result<Option<CoercedValue>, JdwpError> {
        if !is_ref_type_name(&obj.runtime_type) {
            return Ok(None);
        }
        let Some(element) = self.read_named_field(jdwp, obj, REF_ELEMENT_FIELD)? else {
            return Ok(None);
        };
        Ok(self
            .coerce(jdwp, thread, element, expected)?
            .map(|coerced| CoercedValue {
                value: coerced.value,
                boxing: Boxing::RefUnwrapped,
            }))
    }
}
