//! `coroutineContext` inside suspend lambdas and suspend functions.

use nova_jdwp::{JdwpClient, JdwpValue, JvmType, MethodDescriptor, MethodInfo, ObjectRef};

use crate::abi::{CONTINUATION_VARIABLE_NAME, SUSPEND_FUNCTION_COMPLETION_PARAMETER_NAME};
use crate::convert::ValueConverter;
use crate::error::EvalResult;
use crate::finder::{ResolvedValue, VariableFinder};

pub const CONTINUATION_TYPE: &str = "kotlin.coroutines.Continuation";
const GET_CONTEXT_METHOD: &str = "getContext";
const GET_CONTEXT_SIGNATURE: &str = "()Lkotlin/coroutines/CoroutineContext;";
const INVOKE_SUSPEND_METHOD: &str = "invokeSuspend";
const INVOKE_SUSPEND_SIGNATURE: &str = "(Ljava/lang/Object;)Ljava/lang/Object;";

pub const SUSPEND_LAMBDA_CLASSES: &[&str] = &[
    "kotlin.coroutines.jvm.internal.SuspendLambda",
    "kotlin.coroutines.jvm.internal.RestrictedSuspendLambda",
];

impl<'a, C: JdwpClient + ?Sized, V: ValueConverter> VariableFinder<'a, C, V> {
    pub(crate) fn find_coroutine_context(&mut self) -> EvalResult<Option<ResolvedValue>> {
        let Some(location) = self.ctx.jdwp.frame_location(self.ctx.frame.frame)? else {
            return Ok(None);
        };
        let method = location.method;

        let context = match self.coroutine_context_for_lambda(&method)? {
            Some(context) => Some(context),
            None => self.coroutine_context_for_method(&method)?,
        };
        Ok(context.map(|context| ResolvedValue::new(JdwpValue::Object(context))))
    }

    fn coroutine_context_for_lambda(
        &mut self,
        method: &MethodInfo,
    ) -> EvalResult<Option<ObjectRef>> {
        if method.name != INVOKE_SUSPEND_METHOD || method.signature != INVOKE_SUSPEND_SIGNATURE {
            return Ok(None);
        }
        let Some(continuation) = self
            .ctx
            .frame
            .coroutine_frame()
            .and_then(|coroutine| coroutine.continuation.clone())
        else {
            return Ok(None);
        };

        let mut is_suspend_lambda = false;
        for lambda_class in SUSPEND_LAMBDA_CLASSES {
            if self
                .ctx
                .jdwp
                .is_subtype(&continuation.runtime_type, lambda_class)?
            {
                is_suspend_lambda = true;
                break;
            }
        }
        if !is_suspend_lambda {
            return Ok(None);
        }

        self.coroutine_context_for_continuation(&continuation)
    }

    fn coroutine_context_for_method(
        &mut self,
        method: &MethodInfo,
    ) -> EvalResult<Option<ObjectRef>> {
        // Suspend functions take their continuation as the trailing parameter.
        let takes_continuation = MethodDescriptor::parse(&method.signature)
            .and_then(|descriptor| descriptor.parameters.last().cloned())
            .is_some_and(|last| last == JvmType::object(CONTINUATION_TYPE));
        if !takes_continuation {
            return Ok(None);
        }

        let variables = self.visible_variables()?;
        let Some(variable) = [
            CONTINUATION_VARIABLE_NAME,
            SUSPEND_FUNCTION_COMPLETION_PARAMETER_NAME,
        ]
        .iter()
        .find_map(|name| variables.iter().find(|v| v.name == *name)) else {
            return Ok(None);
        };

        match self.ctx.jdwp.local_value(self.ctx.frame.frame, variable)? {
            JdwpValue::Object(continuation) => {
                self.coroutine_context_for_continuation(&continuation)
            }
            _ => Ok(None),
        }
    }

    fn coroutine_context_for_continuation(
        &mut self,
        continuation: &ObjectRef,
    ) -> EvalResult<Option<ObjectRef>> {
        let implements_continuation = self
            .ctx
            .jdwp
            .supertypes(&continuation.runtime_type)?
            .iter()
            .any(|supertype| supertype == CONTINUATION_TYPE);
        if !implements_continuation {
            return Ok(None);
        }

        let Some(get_context) = self
            .ctx
            .jdwp
            .methods_by_name(CONTINUATION_TYPE, GET_CONTEXT_METHOD, GET_CONTEXT_SIGNATURE)?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        Ok(self
            .ctx
            .invoke_method(continuation, &get_context, &[])?
            .as_object()
            .cloned())
    }
}
