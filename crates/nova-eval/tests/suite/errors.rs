use std::io;
use std::sync::{Arc, Mutex};

use nova_eval::{CodeFragmentParameter, EvalError};
use nova_jdwp::{JdwpError, JdwpValue, MockClass, MockFrame, MockJdwpClient};
use tracing_subscriber::fmt::MakeWriter;

use super::support::{find, plain_frame, ty, FRAME};

#[test]
fn disconnected_debuggee_aborts_the_lookup() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(FRAME, MockFrame::new().with_local("x", "int", JdwpValue::Int(1)));
    jdwp.disconnect();

    let err = find(&mut jdwp, &plain_frame(), CodeFragmentParameter::ordinary("x"), ty("int"))
        .expect_err("lookup should fail");
    assert!(
        matches!(err, EvalError::Jdwp(JdwpError::NotConnected)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn exception_thrown_by_a_delegate_is_propagated() {
    let mut jdwp = MockJdwpClient::new();
    jdwp.define_class(
        "Failing",
        MockClass::new().with_method("getValue", "()Ljava/lang/Object;"),
    );
    let delegate = jdwp.object("Failing", vec![]);
    let exception = jdwp.object("java.lang.IllegalStateException", vec![]);
    jdwp.set_invocation_exception(
        delegate.id,
        "getValue",
        "()Ljava/lang/Object;",
        exception.clone(),
    );
    jdwp.insert_frame(
        FRAME,
        MockFrame::new().with_local("lazyValue", "kotlin.Lazy", JdwpValue::Object(delegate)),
    );

    let err = find(
        &mut jdwp,
        &plain_frame(),
        CodeFragmentParameter::delegated("lazyValue"),
        ty("java.lang.String"),
    )
    .expect_err("exception should surface");
    match err {
        EvalError::Jdwp(JdwpError::InvocationException { exception: thrown }) => {
            assert_eq!(thrown, exception)
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn inline_depth_fallback_is_logged_as_a_warning() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::WARN)
        .finish();

    let mut jdwp = MockJdwpClient::new();
    jdwp.insert_frame(
        FRAME,
        MockFrame::new()
            .with_local("x", "int", JdwpValue::Int(5))
            .with_local("$i$f$run", "int", JdwpValue::Int(0))
            .with_local("y$iv", "int", JdwpValue::Int(6)),
    );

    let result = tracing::subscriber::with_default(subscriber, || {
        find(&mut jdwp, &plain_frame(), CodeFragmentParameter::ordinary("x"), ty("int"))
    });

    assert!(result.unwrap().is_some());
    let output = logs.contents();
    assert!(
        output.contains("value taken from the caller of an inlined function"),
        "missing fallback warning in: {output}"
    );
}
