use nova_eval::{
    bind_parameters, write_back_ref_wrappers, CodeFragmentParameter, DebugLabels, EvalError,
    ExecutionContext, VariableFinder,
};
use nova_jdwp::{JdwpClient, JdwpValue, MockFrame, MockJdwpClient};
use pretty_assertions::assert_eq;

use super::support::{plain_frame, ty, FRAME};

#[test]
fn parameters_are_bound_in_order() {
    let mut jdwp = MockJdwpClient::new();
    let receiver = jdwp.object("Foo", vec![("$count", "int", JdwpValue::Int(2))]);
    jdwp.insert_frame(
        FRAME,
        MockFrame::new()
            .with_local("x", "long", JdwpValue::Long(1))
            .with_this(receiver.clone()),
    );
    let frame = plain_frame();

    let ctx = ExecutionContext::new(&mut jdwp, &frame, DebugLabels::new());
    let mut finder = VariableFinder::new(ctx);
    let values = bind_parameters(
        &mut finder,
        &[
            (CodeFragmentParameter::ordinary("x"), ty("long")),
            (CodeFragmentParameter::ordinary("count"), ty("int")),
            (CodeFragmentParameter::dispatch_receiver(), ty("Foo")),
        ],
    )
    .unwrap();

    assert_eq!(
        values,
        vec![
            JdwpValue::Long(1),
            JdwpValue::Int(2),
            JdwpValue::Object(receiver),
        ]
    );
}

#[test]
fn unavailable_parameter_is_reported_as_typed() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, MockFrame::new().with_local("x", "int", JdwpValue::Int(1)));
    let frame = plain_frame();

    let ctx = ExecutionContext::new(&mut jdwp, &frame, DebugLabels::new());
    let mut finder = VariableFinder::new(ctx);
    let err = bind_parameters(
        &mut finder,
        &[
            (CodeFragmentParameter::ordinary("x"), ty("int")),
            (CodeFragmentParameter::extension_receiver("apply"), ty("Foo")),
        ],
    )
    .expect_err("receiver is not in scope");

    assert!(matches!(&err, EvalError::NotAvailable { name } if name == "this@apply"));
    assert_eq!(
        err.to_string(),
        "`this@apply` is not available in the current context"
    );
}

#[test]
fn mutations_through_ref_wrappers_are_written_back() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(
        FRAME,
        MockFrame::new()
            .with_local("counter", "int", JdwpValue::Int(3))
            .with_local("other", "int", JdwpValue::Int(0)),
    );
    let frame = plain_frame();

    let wrappers = {
        let ctx = ExecutionContext::new(&mut jdwp, &frame, DebugLabels::new());
        let mut finder = VariableFinder::new(ctx);
        bind_parameters(
            &mut finder,
            &[(
                CodeFragmentParameter::ordinary("counter"),
                ty("kotlin.jvm.internal.Ref$IntRef"),
            )],
        )
        .unwrap();
        finder.into_ref_wrappers()
    };
    assert_eq!(wrappers.len(), 1);

    // The evaluated fragment increments the captured counter.
    let holder = wrappers[0].wrapper.as_object().unwrap().clone();
    let element = jdwp
        .field_by_name(&holder.runtime_type, "element")
        .unwrap()
        .unwrap();
    jdwp.set_field_value(&holder, &element, JdwpValue::Int(4)).unwrap();

    let mut ctx = ExecutionContext::new(&mut jdwp, &frame, DebugLabels::new());
    let written = write_back_ref_wrappers(&mut ctx, &wrappers).unwrap();
    assert_eq!(written, 1);

    assert_eq!(
        jdwp.set_local_calls,
        vec![(FRAME, "counter".to_string(), JdwpValue::Int(4))]
    );
    let counter = jdwp.visible_variables(FRAME).unwrap().remove(0);
    assert_eq!(jdwp.local_value(FRAME, &counter).unwrap(), JdwpValue::Int(4));
}

#[test]
fn wrappers_for_locals_out_of_scope_are_skipped() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, MockFrame::new().with_local("counter", "int", JdwpValue::Int(3)));
    let frame = plain_frame();

    let wrappers = {
        let ctx = ExecutionContext::new(&mut jdwp, &frame, DebugLabels::new());
        let mut finder = VariableFinder::new(ctx);
        finder
            .find(
                &CodeFragmentParameter::ordinary("counter"),
                &ty("kotlin.jvm.internal.Ref$IntRef"),
            )
            .unwrap();
        finder.into_ref_wrappers()
    };

    jdwp.insert_frame(FRAME, MockFrame::new());
    let mut ctx = ExecutionContext::new(&mut jdwp, &frame, DebugLabels::new());
    assert_eq!(write_back_ref_wrappers(&mut ctx, &wrappers).unwrap(), 0);
    assert!(jdwp.set_local_calls.is_empty());
}
