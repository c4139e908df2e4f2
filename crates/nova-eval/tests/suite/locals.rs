use nova_eval::{
    CodeFragmentParameter, CoroutineFrame, DebugLabels, ExecutionContext, FinderPolicy,
    FrameProxy, ValueDescriptor, VariableFinder,
};
use nova_jdwp::{JdwpValue, MockClass, MockFrame, MockJdwpClient};
use pretty_assertions::assert_eq;

use super::support::{find, find_with_policy, found, plain_frame, ty, FRAME, THREAD};

#[test]
fn exact_local_is_returned_without_ref_wrapping() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, MockFrame::new().with_local("x", "int", JdwpValue::Int(42)));
    let frame = plain_frame();

    let ctx = ExecutionContext::new(&mut jdwp, &frame, DebugLabels::new());
    let mut finder = VariableFinder::new(ctx);
    let result = finder
        .find(&CodeFragmentParameter::ordinary("x"), &ty("int"))
        .unwrap();

    assert_eq!(result, found(JdwpValue::Int(42)));
    assert!(finder.ref_wrappers().is_empty());
}

#[test]
fn repeated_lookups_on_an_unchanged_frame_agree() {
    let mut jdwp = MockJdwpClient::new();
    let text = jdwp.object("java.lang.String", vec![]);
    jdwp.insert_frame(
        FRAME,
        MockFrame::new().with_local("name", "java.lang.String", JdwpValue::Object(text.clone())),
    );
    let frame = plain_frame();

    let ctx = ExecutionContext::new(&mut jdwp, &frame, DebugLabels::new());
    let mut finder = VariableFinder::new(ctx);
    let parameter = CodeFragmentParameter::ordinary("name");
    let first = finder.find(&parameter, &ty("java.lang.String")).unwrap();
    let second = finder.find(&parameter, &ty("java.lang.String")).unwrap();

    assert_eq!(first, found(JdwpValue::Object(text)));
    assert_eq!(first, second);
}

#[test]
fn ir_synthesized_alias_is_found() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, MockFrame::new().with_local("$x", "int", JdwpValue::Int(7)));

    let result = find(&mut jdwp, &plain_frame(), CodeFragmentParameter::ordinary("x"), ty("int"));
    assert_eq!(result.unwrap(), found(JdwpValue::Int(7)));
}

#[test]
fn incompatible_local_type_is_a_miss() {
    let mut jdwp = MockJdwpClient::new();
    let text = jdwp.object("java.lang.String", vec![]);
    jdwp.insert_frame(
        FRAME,
        MockFrame::new().with_local("x", "java.lang.String", JdwpValue::Object(text)),
    );

    let result = find(&mut jdwp, &plain_frame(), CodeFragmentParameter::ordinary("x"), ty("int"));
    assert_eq!(result.unwrap(), None);
}

#[test]
fn null_local_is_found_as_null() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(
        FRAME,
        MockFrame::new().with_local("s", "java.lang.String", JdwpValue::Null),
    );

    let result = find(
        &mut jdwp,
        &plain_frame(),
        CodeFragmentParameter::ordinary("s"),
        ty("java.lang.String"),
    );
    assert_eq!(result.unwrap(), found(JdwpValue::Null));
}

#[test]
fn boxed_local_is_unboxed_for_primitive_parameter() {
    let mut jdwp = MockJdwpClient::new();
    let boxed = jdwp.object("java.lang.Integer", vec![("value", "int", JdwpValue::Int(11))]);
    jdwp.insert_frame(
        FRAME,
        MockFrame::new().with_local("n", "java.lang.Integer", JdwpValue::Object(boxed)),
    );

    let result = find(&mut jdwp, &plain_frame(), CodeFragmentParameter::ordinary("n"), ty("int"));
    assert_eq!(result.unwrap(), found(JdwpValue::Int(11)));
}

fn inlined_frame() -> MockFrame {
    MockFrame::new()
        .with_local("x", "int", JdwpValue::Int(0))
        .with_local("$i$f$outer", "int", JdwpValue::Int(0))
        .with_local("x$iv", "int", JdwpValue::Int(1))
        .with_local("$i$f$inner", "int", JdwpValue::Int(0))
        .with_local("x$iv$iv", "int", JdwpValue::Int(2))
}

#[test]
fn inline_depth_selects_the_matching_copy() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, inlined_frame());

    let result = find(&mut jdwp, &plain_frame(), CodeFragmentParameter::ordinary("x"), ty("int"));
    assert_eq!(result.unwrap(), found(JdwpValue::Int(2)));
}

#[test]
fn explicit_inline_depth_overrides_local_names() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, inlined_frame());
    let frame = FrameProxy::inline(THREAD, FRAME, 1);

    let result = find(&mut jdwp, &frame, CodeFragmentParameter::ordinary("x"), ty("int"));
    assert_eq!(result.unwrap(), found(JdwpValue::Int(1)));
}

fn caller_only_frame() -> MockFrame {
    MockFrame::new()
        .with_local("x", "int", JdwpValue::Int(5))
        .with_local("$i$f$run", "int", JdwpValue::Int(0))
        .with_local("y$iv", "int", JdwpValue::Int(6))
}

#[test]
fn caller_locals_are_used_when_inlined_body_has_no_copy() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, caller_only_frame());

    let result = find(&mut jdwp, &plain_frame(), CodeFragmentParameter::ordinary("x"), ty("int"));
    assert_eq!(result.unwrap(), found(JdwpValue::Int(5)));
}

#[test]
fn caller_locals_are_ignored_without_depth_fallback() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, caller_only_frame());
    let policy = FinderPolicy {
        inline_depth_fallback: false,
        ..FinderPolicy::default()
    };

    let result = find_with_policy(
        &mut jdwp,
        &plain_frame(),
        policy,
        CodeFragmentParameter::ordinary("x"),
        ty("int"),
    );
    assert_eq!(result.unwrap(), None);
}

#[test]
fn delegated_property_yields_the_delegate_value() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.define_class(
        "kotlin.SynchronizedLazyImpl",
        MockClass::new().with_method("getValue", "()Ljava/lang/Object;"),
    );
    let delegate = jdwp.object("kotlin.SynchronizedLazyImpl", vec![]);
    let text = jdwp.object("java.lang.String", vec![]);
    jdwp.set_invocation_result(
        delegate.id,
        "getValue",
        "()Ljava/lang/Object;",
        JdwpValue::Object(text.clone()),
    );
    jdwp.insert_frame(
        FRAME,
        MockFrame::new().with_local("greeting", "kotlin.Lazy", JdwpValue::Object(delegate.clone())),
    );

    let result = find(
        &mut jdwp,
        &plain_frame(),
        CodeFragmentParameter::delegated("greeting"),
        ty("java.lang.String"),
    );

    let resolved = result.unwrap().unwrap();
    assert_eq!(resolved.value, JdwpValue::Object(text));
    assert_ne!(resolved.value.type_name(), Some("kotlin.SynchronizedLazyImpl"));
    assert_eq!(jdwp.invoke_method_calls, vec![(delegate.id, "getValue".to_string())]);
}

#[test]
fn plain_local_is_wrapped_when_fragment_captures_by_reference() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, MockFrame::new().with_local("counter", "int", JdwpValue::Int(3)));
    let frame = plain_frame();

    let ctx = ExecutionContext::new(&mut jdwp, &frame, DebugLabels::new());
    let mut finder = VariableFinder::new(ctx);
    let resolved = finder
        .find(
            &CodeFragmentParameter::ordinary("counter"),
            &ty("kotlin.jvm.internal.Ref$IntRef"),
        )
        .unwrap()
        .unwrap();
    let wrappers = finder.into_ref_wrappers();

    assert_eq!(wrappers.len(), 1);
    assert_eq!(wrappers[0].local_variable_name, "counter");
    assert_eq!(wrappers[0].wrapper, resolved.value);

    let holder = resolved.value.as_object().unwrap();
    assert_eq!(holder.runtime_type, "kotlin.jvm.internal.Ref$IntRef");
    assert_eq!(
        jdwp.object_state(holder.id).unwrap().fields.get("element"),
        Some(&JdwpValue::Int(3))
    );
}

#[test]
fn ref_holder_local_is_unwrapped_without_recording() {
    let mut jdwp = MockJdwpClient::new();
    let holder = jdwp.object(
        "kotlin.jvm.internal.Ref$IntRef",
        vec![("element", "int", JdwpValue::Int(8))],
    );
    jdwp.insert_frame(
        FRAME,
        MockFrame::new().with_local(
            "total",
            "kotlin.jvm.internal.Ref$IntRef",
            JdwpValue::Object(holder),
        ),
    );
    let frame = plain_frame();

    let ctx = ExecutionContext::new(&mut jdwp, &frame, DebugLabels::new());
    let mut finder = VariableFinder::new(ctx);
    let result = finder
        .find(&CodeFragmentParameter::ordinary("total"), &ty("int"))
        .unwrap();

    assert_eq!(result, found(JdwpValue::Int(8)));
    assert!(finder.ref_wrappers().is_empty());
}

#[test]
fn spilled_coroutine_variables_are_searched_like_locals() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, MockFrame::new());
    let frame = FrameProxy::coroutine(
        THREAD,
        FRAME,
        CoroutineFrame {
            continuation: None,
            spilled_variables: vec![ValueDescriptor::value("count", JdwpValue::Int(5))],
            scope_available: false,
        },
    );

    let result = find(&mut jdwp, &frame, CodeFragmentParameter::ordinary("count"), ty("int"));
    assert_eq!(result.unwrap(), found(JdwpValue::Int(5)));
}

#[test]
fn local_function_uses_current_and_legacy_names() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.define_class(
        "MainKt$main$helper$1",
        MockClass::new().implements("kotlin.jvm.functions.Function0"),
    );
    let helper = jdwp.object("MainKt$main$helper$1", vec![]);
    let function_type = ty("kotlin.jvm.functions.Function0");

    jdwp.insert_frame(
        FRAME,
        MockFrame::new().with_local(
            "$fun$helper",
            "MainKt$main$helper$1",
            JdwpValue::Object(helper.clone()),
        ),
    );
    let current = find(
        &mut jdwp,
        &plain_frame(),
        CodeFragmentParameter::local_function("helper"),
        function_type.clone(),
    );
    assert_eq!(current.unwrap(), found(JdwpValue::Object(helper.clone())));

    jdwp.insert_frame(
        FRAME,
        MockFrame::new().with_local(
            "helper$",
            "MainKt$main$helper$1",
            JdwpValue::Object(helper.clone()),
        ),
    );
    let legacy = find(
        &mut jdwp,
        &plain_frame(),
        CodeFragmentParameter::local_function("helper"),
        function_type,
    );
    assert_eq!(legacy.unwrap(), found(JdwpValue::Object(helper)));
}

#[test]
fn field_variable_reads_the_receiver_field() {
    let mut jdwp = MockJdwpClient::new();
    let counter = jdwp.object("Counter", vec![("count", "int", JdwpValue::Int(4))]);
    jdwp.insert_frame(FRAME, MockFrame::new().with_this(counter));

    let result = find(
        &mut jdwp,
        &plain_frame(),
        CodeFragmentParameter::field_var("count"),
        ty("int"),
    );
    assert_eq!(result.unwrap(), found(JdwpValue::Int(4)));
}

#[test]
fn field_variable_reads_static_fields_of_the_declaring_type() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.define_class(
        "Config",
        MockClass::new().with_static_field("LIMIT", "int", JdwpValue::Int(10)),
    );
    jdwp.insert_frame(FRAME, MockFrame::new().at("Config", "<clinit>", "()V"));

    let result = find(
        &mut jdwp,
        &plain_frame(),
        CodeFragmentParameter::field_var("LIMIT"),
        ty("int"),
    );
    assert_eq!(result.unwrap(), found(JdwpValue::Int(10)));
}

#[test]
fn missing_field_variable_is_absent() {
    let mut jdwp = MockJdwpClient::new();
    let counter = jdwp.object("Counter", vec![("count", "int", JdwpValue::Int(4))]);
    jdwp.insert_frame(
        FRAME,
        MockFrame::new()
            .with_this(counter)
            .at("Counter", "increment", "()V"),
    );

    let result = find(
        &mut jdwp,
        &plain_frame(),
        CodeFragmentParameter::field_var("missing"),
        ty("int"),
    );
    assert_eq!(result.unwrap(), None);
}
