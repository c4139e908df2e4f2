use std::collections::HashSet;

use nova_config::DebuggerConfig;
use nova_jdwp::{JdwpClient, JdwpValue, JvmType, LocalVariable, ObjectId, ObjectRef};

use crate::abi::{
    self, inline_depth_of_name, is_captured_receiver_field_name, is_inlined_this,
    is_receiver_or_passed_this, strip_inline_suffixes, synthesized_name, CAPTURED_THIS_FIELD,
    DEFAULT_IMPLS_SUFFIX, LOCAL_FUNCTION_VARIABLE_PREFIX, THIS_IN_DEFAULT_IMPLS,
};
use crate::context::ExecutionContext;
use crate::convert::{is_ref_type, CoercedValue, EvaluatorValueConverter, ValueConverter};
use crate::entity::NamedEntity;
use crate::error::EvalResult;
use crate::kind::VariableKind;
use crate::parameter::{CodeFragmentParameter, ParameterKind};

/// A value found for a code fragment parameter. `value` may be `null`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedValue {
    pub value: JdwpValue,
}

impl ResolvedValue {
    pub fn new(value: JdwpValue) -> Self {
        Self { value }
    }
}

impl From<CoercedValue> for ResolvedValue {
    fn from(coerced: CoercedValue) -> Self {
        Self::new(coerced.value)
    }
}

/// A frame local that was wrapped into a fresh `Ref` holder while binding.
///
/// Mutations the fragment makes through `wrapper` only reach the local after
/// they are written back.
#[derive(Clone, Debug, PartialEq)]
pub struct RefWrapper {
    pub local_variable_name: String,
    pub wrapper: JdwpValue,
}

/// Heuristics that may pick a value the compiler did not bind to the name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinderPolicy {
    /// Search caller locals (inline depth 0) when nothing matches at the current depth.
    pub inline_depth_fallback: bool,
    /// Accept any compatible `this` for labeled and dispatch receivers.
    pub unlabeled_this_fallback: bool,
}

impl Default for FinderPolicy {
    fn default() -> Self {
        Self {
            inline_depth_fallback: true,
            unlabeled_this_fallback: true,
        }
    }
}

impl From<&DebuggerConfig> for FinderPolicy {
    fn from(config: &DebuggerConfig) -> Self {
        Self {
            inline_depth_fallback: config.inline_depth_fallback,
            unlabeled_this_fallback: config.unlabeled_this_fallback,
        }
    }
}

impl From<DebuggerConfig> for FinderPolicy {
    fn from(config: DebuggerConfig) -> Self {
        Self::from(&config)
    }
}

/// Resolves the values a compiled code fragment captures from the suspended frame.
///
/// Locals are tried first, then receivers and closure objects reachable from
/// them, following the names the Kotlin compiler gives captured values.
pub struct VariableFinder<'a, C: JdwpClient + ?Sized, V: ValueConverter = EvaluatorValueConverter>
{
    pub(crate) ctx: ExecutionContext<'a, C>,
    converter: V,
    policy: FinderPolicy,
    ref_wrappers: Vec<RefWrapper>,
}

impl<'a, C: JdwpClient + ?Sized> VariableFinder<'a, C> {
    pub fn new(ctx: ExecutionContext<'a, C>) -> Self {
        Self::with_policy(ctx, FinderPolicy::default())
    }

    pub fn with_policy(ctx: ExecutionContext<'a, C>, policy: FinderPolicy) -> Self {
        Self::with_converter(ctx, EvaluatorValueConverter, policy)
    }
}

impl<'a, C: JdwpClient + ?Sized, V: ValueConverter> VariableFinder<'a, C, V> {
    pub fn with_converter(
        ctx: ExecutionContext<'a, C>,
        converter: V,
        policy: FinderPolicy,
    ) -> Self {
        Self {
            ctx,
            converter,
            policy,
            ref_wrappers: Vec::new(),
        }
    }

    pub fn policy(&self) -> FinderPolicy {
        self.policy
    }

    /// Locals wrapped into `Ref` holders so far, in discovery order.
    pub fn ref_wrappers(&self) -> &[RefWrapper] {
        &self.ref_wrappers
    }

    pub fn into_ref_wrappers(self) -> Vec<RefWrapper> {
        self.ref_wrappers
    }

    pub fn context(&mut self) -> &mut ExecutionContext<'a, C> {
        &mut self.ctx
    }

    /// `Ok(None)` means the value does not exist in this frame. Errors come
    /// from the debuggee and abort the whole lookup.
    pub fn find(
        &mut self,
        parameter: &CodeFragmentParameter,
        ty: &JvmType,
    ) -> EvalResult<Option<ResolvedValue>> {
        let name = parameter.name.as_str();
        let result = match parameter.kind {
            ParameterKind::Ordinary => {
                self.find_ordinary(&VariableKind::ordinary(name, ty.clone(), false))?
            }
            ParameterKind::Delegated => {
                self.find_ordinary(&VariableKind::ordinary(name, ty.clone(), true))?
            }
            ParameterKind::FakeJavaOuterClass => self
                .ctx
                .this_object()?
                .map(|this| ResolvedValue::new(JdwpValue::Object(this))),
            ParameterKind::ExtensionReceiver => {
                self.find_extension_this(&VariableKind::extension_this(name, ty.clone()))?
            }
            ParameterKind::ContextReceiver => {
                self.find_context_receiver(&VariableKind::context_receiver(ty.clone()))?
            }
            ParameterKind::LocalFunction => {
                self.find_local_function(&VariableKind::local_function(name, ty.clone()))?
            }
            ParameterKind::DispatchReceiver => {
                self.find_dispatch_this(&VariableKind::outer_class_this(ty.clone()))?
            }
            ParameterKind::CoroutineContext => self.find_coroutine_context()?,
            ParameterKind::FieldVar => {
                self.find_field_variable(&VariableKind::field_var(name, ty.clone()))?
            }
            ParameterKind::DebugLabel => self.find_debug_label(name),
        };

        tracing::debug!(
            target: "nova.eval",
            kind = ?parameter.kind,
            name = %parameter.name,
            expected = %ty,
            found = result.is_some(),
            "resolved code fragment parameter"
        );
        Ok(result)
    }

    fn find_ordinary(&mut self, kind: &VariableKind) -> EvalResult<Option<ResolvedValue>> {
        let VariableKind::Ordinary { name, .. } = kind else {
            return Ok(None);
        };
        let variables = self.visible_variables()?;

        let exact = |n: &str| n == name.as_str();
        if let Some(found) = self.find_local_variable(&variables, kind, &exact)? {
            return Ok(Some(found));
        }

        // The IR backend aliases captured variables with synthetic locals.
        let synthesized = synthesized_name(name);
        let aliased = |n: &str| n == synthesized;
        if let Some(found) = self.find_local_variable(&variables, kind, &aliased)? {
            return Ok(Some(found));
        }

        if let Some(found) = self.find_captured_variable_in_receiver(&variables, kind)? {
            return Ok(Some(found));
        }

        self.find_captured_variable_in_containing_this(kind)
    }

    fn find_field_variable(&mut self, kind: &VariableKind) -> EvalResult<Option<ResolvedValue>> {
        let VariableKind::FieldVar { field_name, .. } = kind else {
            return Ok(None);
        };

        if let Some(this) = self.ctx.this_object()? {
            if let Some(field) = self.ctx.jdwp.field_by_name(&this.runtime_type, field_name)? {
                let entity = NamedEntity::of_field(field, &this);
                return Ok(Some(ResolvedValue::new(entity.value(&mut *self.ctx.jdwp)?)));
            }
        }

        let Some(location) = self.ctx.jdwp.frame_location(self.ctx.frame.frame)? else {
            return Ok(None);
        };
        match self
            .ctx
            .jdwp
            .field_by_name(&location.declaring_type, field_name)?
        {
            Some(field) if field.is_static => {
                let value = self
                    .ctx
                    .jdwp
                    .static_field_value(&field.declaring_type, &field)?;
                Ok(Some(ResolvedValue::new(value)))
            }
            _ => Ok(None),
        }
    }

    fn find_local_function(&mut self, kind: &VariableKind) -> EvalResult<Option<ResolvedValue>> {
        let VariableKind::LocalFunction { name, .. } = kind else {
            return Ok(None);
        };
        let variables = self.visible_variables()?;

        let new_convention = format!("{LOCAL_FUNCTION_VARIABLE_PREFIX}{name}");
        let prefixed = |n: &str| n == new_convention;
        if let Some(found) = self.find_local_variable(&variables, kind, &prefixed)? {
            return Ok(Some(found));
        }

        // Compilers before 1.3.30 appended `$` instead.
        let old_convention = format!("{name}$");
        let suffixed = |n: &str| n == old_convention;
        if let Some(found) = self.find_local_variable(&variables, kind, &suffixed)? {
            return Ok(Some(found));
        }

        if let Some(found) = self.find_captured_variable_in_receiver(&variables, kind)? {
            return Ok(Some(found));
        }

        self.find_captured_variable_in_containing_this(kind)
    }

    fn find_extension_this(&mut self, kind: &VariableKind) -> EvalResult<Option<ResolvedValue>> {
        let VariableKind::ExtensionThis { parameter_name, .. } = kind else {
            return Ok(None);
        };
        let variables = self.visible_variables()?;

        let nested_prefix = format!("{parameter_name}$");
        let matches_parameter =
            |n: &str| n == parameter_name.as_str() || n.starts_with(nested_prefix.as_str());
        if let Some(found) = self.find_local_variable(&variables, kind, &matches_parameter)? {
            return Ok(Some(found));
        }

        if let Some(found) = self.find_captured_variable_in_receiver(&variables, kind)? {
            return Ok(Some(found));
        }

        if let Some(found) = self.find_captured_variable_in_containing_this(kind)? {
            return Ok(Some(found));
        }

        if self.policy.unlabeled_this_fallback {
            let unlabeled = VariableKind::unlabeled_this(kind.ty().clone());
            if let Some(found) = self.find_unlabeled_this(&unlabeled)? {
                tracing::warn!(
                    target: "nova.eval",
                    label = %parameter_name,
                    "labeled receiver not found; using a compatible unlabeled `this`"
                );
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    fn find_context_receiver(&mut self, kind: &VariableKind) -> EvalResult<Option<ResolvedValue>> {
        let variables = self.visible_variables()?;
        if let Some(found) = self.find_local_variable(&variables, kind, &|n: &str| {
            kind.context_receiver_local_matches(n)
        })? {
            return Ok(Some(found));
        }
        self.find_captured_variable_in_containing_this(kind)
    }

    fn find_dispatch_this(&mut self, kind: &VariableKind) -> EvalResult<Option<ResolvedValue>> {
        if let Some(found) = self.find_captured_variable_in_containing_this(kind)? {
            return Ok(Some(found));
        }

        let variables = self.visible_variables()?;

        if self.is_inside_default_impls()? {
            if let Some(found) =
                self.find_local_variable(&variables, kind, &|n: &str| n == THIS_IN_DEFAULT_IMPLS)?
            {
                return Ok(Some(found));
            }
        }

        let inline_depth = self.effective_inline_depth(&variables);
        if inline_depth > 0 {
            for entity in self.local_entities(&variables) {
                let name = entity.name();
                if !is_inlined_this(name) || inline_depth_of_name(name) != inline_depth {
                    continue;
                }
                let actual = entity.type_name(&mut *self.ctx.jdwp)?;
                if !self.type_matches(kind, actual.as_deref())? {
                    continue;
                }
                if let Some(found) = self.unwrap_and_check(kind, &entity)? {
                    return Ok(Some(found));
                }
            }
        }

        if self.policy.unlabeled_this_fallback {
            let unlabeled = VariableKind::unlabeled_this(kind.ty().clone());
            if let Some(found) = self.find_unlabeled_this(&unlabeled)? {
                tracing::warn!(
                    target: "nova.eval",
                    "dispatch receiver not found; using a compatible unlabeled `this`"
                );
                return Ok(Some(found));
            }

            // Lambdas keep the outer `this$0` among their arguments rather than their locals.
            let arguments = self.ctx.jdwp.argument_values(self.ctx.frame.frame)?;
            for argument in arguments {
                if let Some(found) = self.find_captured_variable(&unlabeled, argument)? {
                    tracing::warn!(
                        target: "nova.eval",
                        "dispatch receiver taken from a frame argument"
                    );
                    return Ok(Some(found));
                }
            }
        }

        Ok(None)
    }

    fn find_debug_label(&self, name: &str) -> Option<ResolvedValue> {
        self.ctx.labels.find(name).map(ResolvedValue::new)
    }

    fn find_unlabeled_this(&mut self, kind: &VariableKind) -> EvalResult<Option<ResolvedValue>> {
        let variables = self.visible_variables()?;
        if let Some(found) = self.find_captured_variable_in_receiver(&variables, kind)? {
            return Ok(Some(found));
        }
        self.find_captured_variable_in_containing_this(kind)
    }

    fn find_captured_variable_in_containing_this(
        &mut self,
        kind: &VariableKind,
    ) -> EvalResult<Option<ResolvedValue>> {
        let frame = self.ctx.frame;
        if let Some(coroutine) = frame.coroutine_frame() {
            if coroutine.scope_available {
                let this = self.ctx.jdwp.this_object(frame.frame)?;
                if let Some(found) = self.find_captured_variable(kind, object_or_null(this))? {
                    return Ok(Some(found));
                }
                let continuation = coroutine.continuation.clone();
                return self.find_captured_variable(kind, object_or_null(continuation));
            }
        }

        match self.ctx.this_object()? {
            Some(this) => self.find_captured_variable(kind, JdwpValue::Object(this)),
            None => Ok(None),
        }
    }

    fn find_captured_variable_in_receiver(
        &mut self,
        variables: &[LocalVariable],
        kind: &VariableKind,
    ) -> EvalResult<Option<ResolvedValue>> {
        let entities = self.local_entities(variables);

        if matches!(kind, VariableKind::ExtensionThis { .. }) {
            for entity in &entities {
                if !kind.captured_name_matches(entity.name()) {
                    continue;
                }
                let actual = entity.type_name(&mut *self.ctx.jdwp)?;
                if !self.type_matches(kind, actual.as_deref())? {
                    continue;
                }
                if let Some(found) = self.unwrap_and_check(kind, entity)? {
                    return Ok(Some(found));
                }
            }
        }

        for entity in &entities {
            if !is_receiver_or_passed_this(entity.name()) {
                continue;
            }
            let receiver = entity.value(&mut *self.ctx.jdwp)?;
            if let Some(found) = self.find_captured_variable(kind, receiver)? {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    /// Searches `parent` and the closure objects reachable from it.
    pub(crate) fn find_captured_variable(
        &mut self,
        kind: &VariableKind,
        parent: JdwpValue,
    ) -> EvalResult<Option<ResolvedValue>> {
        let mut visited = HashSet::new();
        self.find_captured_variable_in(kind, parent, &mut visited)
    }

    fn find_captured_variable_in(
        &mut self,
        kind: &VariableKind,
        parent: JdwpValue,
        visited: &mut HashSet<ObjectId>,
    ) -> EvalResult<Option<ResolvedValue>> {
        if matches!(parent, JdwpValue::Null | JdwpValue::Void) {
            return Ok(None);
        }
        if kind.accepts_parent_value() && self.type_matches(kind, parent.type_name())? {
            return Ok(Some(ResolvedValue::new(parent)));
        }

        let Some(owner) = parent.as_object() else {
            return Ok(None);
        };
        // Closures can capture each other; every object is inspected once.
        if !visited.insert(owner.id) {
            return Ok(None);
        }
        let fields = self.field_entities(owner)?;

        if !matches!(kind, VariableKind::OuterClassThis { .. }) {
            for field in &fields {
                if !kind.captured_name_matches(field.name()) {
                    continue;
                }
                let actual = field.type_name(&mut *self.ctx.jdwp)?;
                if !self.type_matches(kind, actual.as_deref())? {
                    continue;
                }
                if let Some(found) = self.unwrap_and_check(kind, field)? {
                    return Ok(Some(found));
                }
            }

            for field in &fields {
                if !is_captured_receiver_field_name(field.name()) {
                    continue;
                }
                let receiver = field.value(&mut *self.ctx.jdwp)?;
                if let Some(found) = self.find_captured_variable_in(kind, receiver, visited)? {
                    return Ok(Some(found));
                }
            }
        }

        for field in &fields {
            let name = field.name();
            if name != THIS_IN_DEFAULT_IMPLS && name != CAPTURED_THIS_FIELD {
                continue;
            }
            let outer = field.value(&mut *self.ctx.jdwp)?;
            if let Some(found) = self.find_captured_variable_in(kind, outer, visited)? {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    fn find_local_variable(
        &mut self,
        variables: &[LocalVariable],
        kind: &VariableKind,
        matches_name: &dyn Fn(&str) -> bool,
    ) -> EvalResult<Option<ResolvedValue>> {
        let inline_depth = self.effective_inline_depth(variables);

        if let Some(found) =
            self.find_local_variable_at_depth(variables, kind, inline_depth, matches_name)?
        {
            return Ok(Some(found));
        }

        if inline_depth > 0 && self.policy.inline_depth_fallback {
            if let Some(found) =
                self.find_local_variable_at_depth(variables, kind, 0, matches_name)?
            {
                tracing::warn!(
                    target: "nova.eval",
                    inline_depth,
                    "value taken from the caller of an inlined function"
                );
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    fn find_local_variable_at_depth(
        &mut self,
        variables: &[LocalVariable],
        kind: &VariableKind,
        inline_depth: usize,
        matches_name: &dyn Fn(&str) -> bool,
    ) -> EvalResult<Option<ResolvedValue>> {
        let name_matches = |name: &str| {
            if inline_depth == 0 {
                matches_name(name)
            } else {
                matches_name(strip_inline_suffixes(name))
                    && inline_depth_of_name(name) == inline_depth
            }
        };

        let mut entities = self.local_entities(variables);
        if let Some(coroutine) = self.ctx.frame.coroutine_frame() {
            entities.extend(
                coroutine
                    .spilled_variables
                    .iter()
                    .map(NamedEntity::of_descriptor),
            );
        }

        for entity in &entities {
            if !name_matches(entity.name()) {
                continue;
            }
            let actual = entity.type_name(&mut *self.ctx.jdwp)?;
            if !self.type_matches(kind, actual.as_deref())? {
                continue;
            }

            let raw = entity.value(&mut *self.ctx.jdwp)?;
            let unwrapped = self.unwrap_delegate(kind, raw.clone())?;
            let Some(coerced) = self.coerce(kind, unwrapped)? else {
                continue;
            };

            if !is_ref_type(&raw) && is_ref_type(&coerced.value) {
                self.ref_wrappers.push(RefWrapper {
                    local_variable_name: entity.name().to_string(),
                    wrapper: coerced.value.clone(),
                });
            }
            return Ok(Some(coerced.into()));
        }

        Ok(None)
    }

    fn unwrap_and_check(
        &mut self,
        kind: &VariableKind,
        entity: &NamedEntity,
    ) -> EvalResult<Option<ResolvedValue>> {
        let raw = entity.value(&mut *self.ctx.jdwp)?;
        let unwrapped = self.unwrap_delegate(kind, raw)?;
        Ok(self.coerce(kind, unwrapped)?.map(ResolvedValue::from))
    }

    /// Replaces a delegated property's delegate with the value it yields.
    fn unwrap_delegate(&mut self, kind: &VariableKind, raw: JdwpValue) -> EvalResult<JdwpValue> {
        if !kind.is_delegated() {
            return Ok(raw);
        }
        let delegate = match &raw {
            JdwpValue::Object(delegate) => delegate.clone(),
            _ => return Ok(raw),
        };
        let Some(get_value) = self
            .ctx
            .jdwp
            .methods_by_name(&delegate.runtime_type, "getValue", "()Ljava/lang/Object;")?
            .into_iter()
            .next()
        else {
            return Ok(raw);
        };
        self.ctx.invoke_method(&delegate, &get_value, &[])
    }

    fn type_matches(&mut self, kind: &VariableKind, actual: Option<&str>) -> EvalResult<bool> {
        // The delegate's type says nothing about the value; the coercion after
        // unwrapping checks it.
        if kind.is_delegated() {
            return Ok(true);
        }
        Ok(self
            .converter
            .type_matches(&mut *self.ctx.jdwp, kind.ty(), actual)?)
    }

    fn coerce(
        &mut self,
        kind: &VariableKind,
        value: JdwpValue,
    ) -> EvalResult<Option<CoercedValue>> {
        let thread = self.ctx.frame.thread;
        Ok(self
            .converter
            .coerce(&mut *self.ctx.jdwp, thread, value, kind.ty())?)
    }

    fn is_inside_default_impls(&mut self) -> EvalResult<bool> {
        Ok(self
            .ctx
            .jdwp
            .frame_location(self.ctx.frame.frame)?
            .is_some_and(|location| location.declaring_type.ends_with(DEFAULT_IMPLS_SUFFIX)))
    }

    fn effective_inline_depth(&self, variables: &[LocalVariable]) -> usize {
        self.ctx
            .frame
            .explicit_inline_depth()
            .unwrap_or_else(|| abi::inline_depth(variables))
    }

    pub(crate) fn visible_variables(&mut self) -> EvalResult<Vec<LocalVariable>> {
        Ok(self.ctx.jdwp.visible_variables(self.ctx.frame.frame)?)
    }

    fn local_entities(&self, variables: &[LocalVariable]) -> Vec<NamedEntity> {
        let frame = self.ctx.frame.frame;
        variables
            .iter()
            .map(|variable| NamedEntity::of_local(variable, frame))
            .collect()
    }

    fn field_entities(&mut self, owner: &ObjectRef) -> EvalResult<Vec<NamedEntity>> {
        Ok(self
            .ctx
            .jdwp
            .fields(&owner.runtime_type)?
            .into_iter()
            .map(|field| NamedEntity::of_field(field, owner))
            .collect())
    }
}

fn object_or_null(object: Option<ObjectRef>) -> JdwpValue {
    object.map_or(JdwpValue::Null, JdwpValue::Object)
}
