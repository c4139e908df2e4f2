use nova_jdwp::JvmType;
use regex::Regex;

use crate::abi::{
    self, captured_field_name, captured_variable_name_regex, labeled_this_name, CAPTURED_PREFIX,
    CAPTURED_RECEIVER_FIELD, CONTEXT_RECEIVER_PREFIX, LABELED_THIS_FIELD, LABELED_THIS_PARAMETER,
    OLD_CONTEXT_RECEIVER_PREFIX, RECEIVER_PARAMETER_NAME,
};

/// What a single resolution request is looking for.
///
/// Each variant fixes the expected type and how compiler-synthesized fields
/// carrying the value are named.
#[derive(Clone, Debug)]
pub enum VariableKind {
    Ordinary {
        name: String,
        ty: JvmType,
        is_delegated: bool,
        captured_name: Regex,
    },
    LocalFunction {
        name: String,
        ty: JvmType,
    },
    UnlabeledThis {
        ty: JvmType,
    },
    OuterClassThis {
        ty: JvmType,
    },
    FieldVar {
        field_name: String,
        ty: JvmType,
    },
    ExtensionThis {
        label: String,
        ty: JvmType,
        /// Local/parameter spelling (`$this$label`, or `$receiver`).
        parameter_name: String,
        /// Captured field spelling (`$this_label`, or `receiver$0`).
        field_name: String,
        captured_name: Regex,
    },
    ContextReceiver {
        ty: JvmType,
    },
}

impl VariableKind {
    pub fn ordinary(name: &str, ty: JvmType, is_delegated: bool) -> Self {
        Self::Ordinary {
            name: name.to_string(),
            ty,
            is_delegated,
            captured_name: captured_variable_name_regex(&captured_field_name(name)),
        }
    }

    pub fn local_function(name: &str, ty: JvmType) -> Self {
        Self::LocalFunction {
            name: name.to_string(),
            ty,
        }
    }

    pub fn unlabeled_this(ty: JvmType) -> Self {
        Self::UnlabeledThis { ty }
    }

    pub fn outer_class_this(ty: JvmType) -> Self {
        Self::OuterClassThis { ty }
    }

    pub fn field_var(field_name: &str, ty: JvmType) -> Self {
        Self::FieldVar {
            field_name: field_name.to_string(),
            ty,
        }
    }

    pub fn extension_this(label: &str, ty: JvmType) -> Self {
        let parameter_name =
            labeled_this_name(label, LABELED_THIS_PARAMETER, RECEIVER_PARAMETER_NAME);
        let field_name = labeled_this_name(
            label,
            &captured_field_name(LABELED_THIS_FIELD),
            CAPTURED_RECEIVER_FIELD,
        );
        let captured_name = captured_variable_name_regex(&field_name);
        Self::ExtensionThis {
            label: label.to_string(),
            ty,
            parameter_name,
            field_name,
            captured_name,
        }
    }

    pub fn context_receiver(ty: JvmType) -> Self {
        Self::ContextReceiver { ty }
    }

    pub fn ty(&self) -> &JvmType {
        match self {
            Self::Ordinary { ty, .. }
            | Self::LocalFunction { ty, .. }
            | Self::UnlabeledThis { ty }
            | Self::OuterClassThis { ty }
            | Self::FieldVar { ty, .. }
            | Self::ExtensionThis { ty, .. }
            | Self::ContextReceiver { ty } => ty,
        }
    }

    pub fn is_delegated(&self) -> bool {
        matches!(
            self,
            Self::Ordinary {
                is_delegated: true,
                ..
            }
        )
    }

    /// Receiver-like kinds can be satisfied by the search root itself.
    pub fn accepts_parent_value(&self) -> bool {
        matches!(self, Self::UnlabeledThis { .. } | Self::OuterClassThis { .. })
    }

    /// Whether a field on a closure object named `name` carries this value.
    pub fn captured_name_matches(&self, name: &str) -> bool {
        match self {
            Self::Ordinary { captured_name, .. } | Self::ExtensionThis { captured_name, .. } => {
                captured_name.is_match(name)
            }
            Self::LocalFunction { name: function, .. } => {
                name.strip_prefix(CAPTURED_PREFIX) == Some(function.as_str())
            }
            Self::UnlabeledThis { .. } => {
                name == CAPTURED_RECEIVER_FIELD
                    || name.starts_with(&captured_field_name(LABELED_THIS_FIELD))
            }
            // Captured outer `this` is followed through `this$0`, and captured
            // `field` is not supported.
            Self::OuterClassThis { .. } | Self::FieldVar { .. } => false,
            Self::ContextReceiver { .. } => {
                name.starts_with(CONTEXT_RECEIVER_PREFIX)
                    || name.starts_with(&captured_field_name(CONTEXT_RECEIVER_PREFIX))
                    || name.starts_with(OLD_CONTEXT_RECEIVER_PREFIX)
                    || name.starts_with(&captured_field_name(OLD_CONTEXT_RECEIVER_PREFIX))
            }
        }
    }

    /// Context receivers may also arrive as the explicit `this` of `DefaultImpls`.
    pub(crate) fn context_receiver_local_matches(&self, name: &str) -> bool {
        self.captured_name_matches(name) || name.starts_with(abi::THIS_IN_DEFAULT_IMPLS)
    }
}
