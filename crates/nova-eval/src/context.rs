use nova_jdwp::{JdwpClient, JdwpValue, MethodInfo, ObjectRef};

use crate::error::EvalResult;
use crate::frame::FrameProxy;
use crate::labels::DebugLabels;

/// Everything one evaluation needs from the debug session.
pub struct ExecutionContext<'a, C: JdwpClient + ?Sized> {
    pub jdwp: &'a mut C,
    pub frame: &'a FrameProxy,
    pub labels: DebugLabels,
    this_object: Option<ObjectRef>,
}

impl<'a, C: JdwpClient + ?Sized> ExecutionContext<'a, C> {
    pub fn new(jdwp: &'a mut C, frame: &'a FrameProxy, labels: DebugLabels) -> Self {
        Self {
            jdwp,
            frame,
            labels,
            this_object: None,
        }
    }

    /// Overrides the frame's `this`, e.g. when evaluating inside a lambda the
    /// evaluator has already unwrapped.
    pub fn with_this_object(mut self, this_object: ObjectRef) -> Self {
        self.this_object = Some(this_object);
        self
    }

    pub fn this_object(&mut self) -> EvalResult<Option<ObjectRef>> {
        if let Some(this_object) = &self.this_object {
            return Ok(Some(this_object.clone()));
        }
        Ok(self.jdwp.this_object(self.frame.frame)?)
    }

    /// Invokes `method` on `object` in the suspended thread.
    pub fn invoke_method(
        &mut self,
        object: &ObjectRef,
        method: &MethodInfo,
        args: &[JdwpValue],
    ) -> EvalResult<JdwpValue> {
        tracing::debug!(
            target: "nova.eval",
            object_id = object.id,
            method = %method.name,
            "invoking method in debuggee"
        );
        Ok(self
            .jdwp
            .invoke_method(self.frame.thread, object, method, args)?)
    }
}
