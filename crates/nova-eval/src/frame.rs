use nova_jdwp::{FieldInfo, FrameId, JdwpValue, ObjectRef, ThreadId};

/// The suspended frame an evaluation runs against.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameProxy {
    pub thread: ThreadId,
    pub frame: FrameId,
    pub flavor: FrameFlavor,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FrameFlavor {
    Plain,
    /// A virtual frame for code inlined into the physical frame. The depth is
    /// known from the debug info and overrides the one derived from local names.
    Inline { inline_depth: usize },
    Coroutine(CoroutineFrame),
}

/// A frame restored from a coroutine's continuation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoroutineFrame {
    pub continuation: Option<ObjectRef>,
    /// Locals the compiler spilled into the continuation across suspension points.
    pub spilled_variables: Vec<ValueDescriptor>,
    /// Whether `this` and the continuation can be searched for captured values.
    pub scope_available: bool,
}

impl FrameProxy {
    pub fn new(thread: ThreadId, frame: FrameId) -> Self {
        Self {
            thread,
            frame,
            flavor: FrameFlavor::Plain,
        }
    }

    pub fn inline(thread: ThreadId, frame: FrameId, inline_depth: usize) -> Self {
        Self {
            thread,
            frame,
            flavor: FrameFlavor::Inline { inline_depth },
        }
    }

    pub fn coroutine(thread: ThreadId, frame: FrameId, coroutine: CoroutineFrame) -> Self {
        Self {
            thread,
            frame,
            flavor: FrameFlavor::Coroutine(coroutine),
        }
    }

    pub fn explicit_inline_depth(&self) -> Option<usize> {
        match self.flavor {
            FrameFlavor::Inline { inline_depth } => Some(inline_depth),
            _ => None,
        }
    }

    pub fn coroutine_frame(&self) -> Option<&CoroutineFrame> {
        match &self.flavor {
            FrameFlavor::Coroutine(coroutine) => Some(coroutine),
            _ => None,
        }
    }
}

/// A value shown in the variables view that is not a frame local.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueDescriptor {
    pub name: String,
    pub source: DescriptorSource,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DescriptorSource {
    Value(JdwpValue),
    Field { owner: ObjectRef, field: FieldInfo },
}

impl ValueDescriptor {
    pub fn value(name: impl Into<String>, value: JdwpValue) -> Self {
        Self {
            name: name.into(),
            source: DescriptorSource::Value(value),
        }
    }

    pub fn field(name: impl Into<String>, owner: ObjectRef, field: FieldInfo) -> Self {
        Self {
            name: name.into(),
            source: DescriptorSource::Field { owner, field },
        }
    }
}
