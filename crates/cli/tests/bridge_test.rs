//! Drives the real helper binary through the parent side of the bridge

use std::fs;
use std::sync::Arc;

use ptf_core::backends::{AdapterBackend, InteractiveBackend};
use ptf_core::bridge::{BridgeOutcome, ChildConsoleBridge};
use ptf_core::{
    DispatchRequest, DispatchStatus, EnumType, MethodSignature, TypeDescriptor, Value, marshal,
};

fn helper_with_answers(answers: &str) -> (ChildConsoleBridge, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("answers.txt");
    fs::write(&path, answers).unwrap();
    let bridge = ChildConsoleBridge::new(env!("CARGO_BIN_EXE_ptf-console"))
        .with_args(["--answers".to_string(), path.display().to_string()]);
    (bridge, dir)
}

fn negotiate() -> MethodSignature {
    MethodSignature::new("Negotiate")
        .input("clientVersion", TypeDescriptor::String)
        .output("serverVersion", TypeDescriptor::I32)
        .returns(TypeDescriptor::I32)
}

#[test]
fn test_bridge_round_trip() {
    let (bridge, _dir) = helper_with_answers("Y\n5\n");
    let table = marshal::build(&negotiate(), &[Value::from("1.0")]).unwrap();

    match bridge.call("Negotiate the protocol dialect.", &table).unwrap() {
        BridgeOutcome::Completed(result) => {
            assert_eq!(result.return_value.as_deref(), Some("1"));
            assert_eq!(result.out_arg_values["serverVersion"], "5");
        }
        BridgeOutcome::Aborted => panic!("helper aborted"),
    }
}

#[test]
fn test_spawned_interactive_backend() {
    let (bridge, _dir) = helper_with_answers("Y\n5\n");
    let mut backend = InteractiveBackend::spawned(bridge);
    let request =
        DispatchRequest::from_slots(Arc::new(negotiate()), &[Value::from("1.0"), Value::Null]);

    let result = backend.invoke(&request).unwrap();
    assert_eq!(result.status, DispatchStatus::Ok);
    assert_eq!(result.return_value, Some(Value::Int(1)));
    assert_eq!(result.out_values, vec![Value::Int(5)]);
}

#[test]
fn test_spawned_abort() {
    let (bridge, _dir) = helper_with_answers("A\n");
    let mut backend = InteractiveBackend::spawned(bridge);
    let request = DispatchRequest::from_slots(Arc::new(MethodSignature::new("Abort")), &[]);

    let result = backend.invoke(&request).unwrap();
    assert_eq!(result.status, DispatchStatus::Aborted);
}

#[test]
fn test_helper_failure_is_reported() {
    let (bridge, _dir) = helper_with_answers("");
    let table = marshal::build(&negotiate(), &[Value::from("1.0")]).unwrap();

    let err = bridge.call("help", &table).unwrap_err();
    assert!(matches!(
        err,
        ptf_core::Error::ChildProcessFailed { code: Some(1), .. }
    ));
}

#[cfg(unix)]
#[test]
fn test_rejected_answer_respawns_helper() {
    // the helper cannot check enum members, so the first spawn answers
    // "smb5" and the parent has to send the call back for "smb3"
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    let marker = dir.path().join("spawned");
    let help_log = dir.path().join("help.log");
    fs::write(&first, "Y\nsmb5\n").unwrap();
    fs::write(&second, "Y\nsmb3\n").unwrap();

    let script = format!(
        "printf '%s\\n' \"$0\" >> '{log}'\n\
         if [ -e '{marker}' ]; then a='{second}'; else touch '{marker}'; a='{first}'; fi\n\
         exec '{helper}' --answers \"$a\" \"$0\"\n",
        log = help_log.display(),
        marker = marker.display(),
        first = first.display(),
        second = second.display(),
        helper = env!("CARGO_BIN_EXE_ptf-console"),
    );
    let bridge = ChildConsoleBridge::new("sh").with_args(["-c".to_string(), script]);
    let mut backend = InteractiveBackend::spawned(bridge);

    let dialect = EnumType::new("Dialect", ["Smb2", "Smb3"]);
    let sig = MethodSignature::new("PickDialect")
        .output("dialect", TypeDescriptor::Enum(dialect.clone()));
    let request = DispatchRequest::from_slots(Arc::new(sig), &[Value::Null]);

    let result = backend.invoke(&request).unwrap();
    assert_eq!(result.status, DispatchStatus::Ok);
    assert_eq!(result.out_values, vec![dialect.value("Smb3").unwrap()]);

    let requests = fs::read_to_string(&help_log).unwrap();
    assert_eq!(requests.lines().count(), 2);
    let retry = requests.lines().nth(1).unwrap();
    assert!(retry.contains("Invalid value"));
    assert!(retry.contains("smb5"));
}
