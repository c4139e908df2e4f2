use std::cell::OnceCell;

use nova_jdwp::{FieldInfo, FrameId, JdwpClient, JdwpError, JdwpValue, LocalVariable, ObjectRef};

use crate::frame::{DescriptorSource, ValueDescriptor};

#[derive(Debug)]
enum Source {
    Field { owner: ObjectRef, field: FieldInfo },
    Local { frame: FrameId, variable: LocalVariable },
    Descriptor(ValueDescriptor),
}

/// A named candidate value during one search.
///
/// The type and the value are fetched from the debuggee at most once.
#[derive(Debug)]
pub(crate) struct NamedEntity {
    source: Source,
    ty: OnceCell<Option<String>>,
    value: OnceCell<JdwpValue>,
}

impl NamedEntity {
    fn new(source: Source) -> Self {
        Self {
            source,
            ty: OnceCell::new(),
            value: OnceCell::new(),
        }
    }

    pub(crate) fn of_field(field: FieldInfo, owner: &ObjectRef) -> Self {
        Self::new(Source::Field {
            owner: owner.clone(),
            field,
        })
    }

    pub(crate) fn of_local(variable: &LocalVariable, frame: FrameId) -> Self {
        Self::new(Source::Local {
            frame,
            variable: variable.clone(),
        })
    }

    pub(crate) fn of_descriptor(descriptor: &ValueDescriptor) -> Self {
        Self::new(Source::Descriptor(descriptor.clone()))
    }

    pub(crate) fn name(&self) -> &str {
        match &self.source {
            Source::Field { field, .. } => &field.name,
            Source::Local { variable, .. } => &variable.name,
            Source::Descriptor(descriptor) => &descriptor.name,
        }
    }

    /// Declared type for fields and locals, runtime type for descriptors.
    pub(crate) fn type_name<C: JdwpClient + ?Sized>(
        &self,
        jdwp: &mut C,
    ) -> Result<Option<String>, JdwpError> {
        if let Some(ty) = self.ty.get() {
            return Ok(ty.clone());
        }
        let ty = match &self.source {
            Source::Field { field, .. } => Some(field.type_name.clone()),
            Source::Local { variable, .. } => variable.type_name.clone(),
            Source::Descriptor(_) => self.value(jdwp)?.type_name().map(str::to_owned),
        };
        Ok(self.ty.get_or_init(|| ty).clone())
    }

    pub(crate) fn value<C: JdwpClient + ?Sized>(&self, jdwp: &mut C) -> Result<JdwpValue, JdwpError> {
        if let Some(value) = self.value.get() {
            return Ok(value.clone());
        }
        let value = match &self.source {
            Source::Field { owner, field } => read_field(jdwp, owner, field)?,
            Source::Local { frame, variable } => jdwp.local_value(*frame, variable)?,
            Source::Descriptor(descriptor) => match &descriptor.source {
                DescriptorSource::Value(value) => value.clone(),
                DescriptorSource::Field { owner, field } => read_field(jdwp, owner, field)?,
            },
        };
        Ok(self.value.get_or_init(|| value).clone())
    }
}

fn read_field<C: JdwpClient + ?Sized>(
    jdwp: &mut C,
    owner: &ObjectRef,
    field: &FieldInfo,
) -> Result<JdwpValue, JdwpError> {
    if field.is_static {
        jdwp.static_field_value(&field.declaring_type, field)
    } else {
        jdwp.field_value(owner, field)
    }
}
