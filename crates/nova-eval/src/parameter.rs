/// How a code fragment refers to a value from the surrounding frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Ordinary,
    Delegated,
    /// The Java-style outer class instance, always the current receiver.
    FakeJavaOuterClass,
    ExtensionReceiver,
    ContextReceiver,
    LocalFunction,
    DispatchReceiver,
    CoroutineContext,
    FieldVar,
    DebugLabel,
}

/// A logical parameter of a compiled code fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeFragmentParameter {
    pub kind: ParameterKind,
    /// Variable name, receiver label or field name. Empty for kinds that don't need one.
    pub name: String,
    /// What the user typed, used when reporting an unavailable value.
    pub debug_string: String,
}

impl CodeFragmentParameter {
    pub fn new(kind: ParameterKind, name: impl Into<String>) -> Self {
        let name = name.into();
        let debug_string = match kind {
            ParameterKind::ExtensionReceiver | ParameterKind::DispatchReceiver
                if !name.is_empty() =>
            {
                format!("this@{name}")
            }
            ParameterKind::ExtensionReceiver
            | ParameterKind::DispatchReceiver
            | ParameterKind::ContextReceiver
            | ParameterKind::FakeJavaOuterClass => "this".to_string(),
            ParameterKind::CoroutineContext => "coroutineContext".to_string(),
            ParameterKind::FieldVar => format!("field {name}"),
            ParameterKind::DebugLabel => format!("{name}_DebugLabel"),
            _ => name.clone(),
        };
        Self {
            kind,
            name,
            debug_string,
        }
    }

    pub fn ordinary(name: impl Into<String>) -> Self {
        Self::new(ParameterKind::Ordinary, name)
    }

    pub fn delegated(name: impl Into<String>) -> Self {
        Self::new(ParameterKind::Delegated, name)
    }

    pub fn extension_receiver(label: impl Into<String>) -> Self {
        Self::new(ParameterKind::ExtensionReceiver, label)
    }

    pub fn dispatch_receiver() -> Self {
        Self::new(ParameterKind::DispatchReceiver, "")
    }

    pub fn context_receiver() -> Self {
        Self::new(ParameterKind::ContextReceiver, "")
    }

    pub fn local_function(name: impl Into<String>) -> Self {
        Self::new(ParameterKind::LocalFunction, name)
    }

    pub fn coroutine_context() -> Self {
        Self::new(ParameterKind::CoroutineContext, "")
    }

    pub fn field_var(name: impl Into<String>) -> Self {
        Self::new(ParameterKind::FieldVar, name)
    }

    pub fn debug_label(name: impl Into<String>) -> Self {
        Self::new(ParameterKind::DebugLabel, name)
    }

    pub fn fake_java_outer_class() -> Self {
        Self::new(ParameterKind::FakeJavaOuterClass, "")
    }
}
