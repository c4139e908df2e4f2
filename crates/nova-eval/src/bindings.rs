//! Binding compiled code fragment parameters to debuggee values.

use nova_jdwp::{JdwpClient, JdwpValue, JvmType};

use crate::context::ExecutionContext;
use crate::convert::{ValueConverter, REF_ELEMENT_FIELD};
use crate::error::{EvalError, EvalResult};
use crate::finder::{RefWrapper, VariableFinder};
use crate::parameter::CodeFragmentParameter;

/// Resolves every parameter in order, failing on the first one that does not
/// exist in the current frame.
pub fn bind_parameters<C, V>(
    finder: &mut VariableFinder<'_, C, V>,
    parameters: &[(CodeFragmentParameter, JvmType)],
) -> EvalResult<Vec<JdwpValue>>
where
    C: JdwpClient + ?Sized,
    V: ValueConverter,
{
    let mut values = Vec::with_capacity(parameters.len());
    for (parameter, ty) in parameters {
        match finder.find(parameter, ty)? {
            Some(resolved) => values.push(resolved.value),
            None => {
                return Err(EvalError::NotAvailable {
                    name: parameter.debug_string.clone(),
                })
            }
        }
    }
    Ok(values)
}

/// Copies the current contents of each `Ref` wrapper back into the local it
/// was created for. Returns how many locals were updated.
///
/// Locals that are no longer visible, and wrappers without an `element`
/// field, are skipped.
pub fn write_back_ref_wrappers<C: JdwpClient + ?Sized>(
    ctx: &mut ExecutionContext<'_, C>,
    wrappers: &[RefWrapper],
) -> EvalResult<usize> {
    if wrappers.is_empty() {
        return Ok(0);
    }

    let frame = ctx.frame.frame;
    let variables = ctx.jdwp.visible_variables(frame)?;
    let mut written = 0;
    for wrapper in wrappers {
        let Some(holder) = wrapper.wrapper.as_object() else {
            continue;
        };
        let Some(variable) = variables
            .iter()
            .find(|v| v.name == wrapper.local_variable_name)
        else {
            tracing::debug!(
                target: "nova.eval",
                name = %wrapper.local_variable_name,
                "skipping write-back of a local that is no longer visible"
            );
            continue;
        };
        let Some(element) = ctx
            .jdwp
            .field_by_name(&holder.runtime_type, REF_ELEMENT_FIELD)?
        else {
            continue;
        };

        let value = ctx.jdwp.field_value(holder, &element)?;
        ctx.jdwp.set_local_value(frame, variable, value)?;
        written += 1;
    }
    Ok(written)
}
