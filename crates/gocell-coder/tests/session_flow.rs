mod common;

use common::{coder, config, names, FakeToolchain};
use gocell_coder::{Coder, ProcessOutput, TurnError};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_define_display_then_fail() {
    let (_dir, toolchain, mut coder) = coder();

    assert_eq!(coder.input_and_run("a := 1").unwrap(), "");
    assert_eq!(names(&coder), vec!["a"]);
    let first = toolchain.last_program();
    assert!(first.contains("\ta := 1\n"));
    assert!(first.contains("\t_Serialize(\"var-a\", a)\n"));

    toolchain.then_ok("2");
    assert_eq!(coder.input_and_run("a + 1").unwrap(), "2");
    assert_eq!(names(&coder), vec!["a"]);
    let second = toolchain.last_program();
    assert!(second.contains("\ta, _ := _Deserialize[int](\"var-a\")\n"));
    assert!(second.contains("fmt.Println(a + 1)"));
    assert!(!second.contains(":INPUT"));

    toolchain.then_fail_at("a +)", "syntax error: unexpected )");
    let err = coder.input_and_run("a +").unwrap_err();
    assert!(!err.is_benign());
    match err {
        TurnError::Run { text, .. } => {
            assert!(text.ends_with(": syntax error: unexpected )"));
            assert!(!text.starts_with("# "));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(names(&coder).is_empty());
}

#[test]
fn test_first_definition_order() {
    let (_dir, toolchain, mut coder) = coder();
    coder.input_and_run("b := 2\na := 1").unwrap();
    assert_eq!(names(&coder), vec!["b", "a"]);

    coder.input_and_run("c := a + b").unwrap();
    assert_eq!(names(&coder), vec!["b", "a", "c"]);
    let program = toolchain.last_program();
    let b = program.find("_Serialize(\"var-b\"").unwrap();
    let a = program.find("_Serialize(\"var-a\"").unwrap();
    let c = program.find("_Serialize(\"var-c\"").unwrap();
    assert!(b < a && a < c);
}

#[test]
fn test_replay_is_idempotent() {
    let (_dir, toolchain, mut coder) = coder();
    coder.input_and_run("a := 1").unwrap();
    for _ in 0..3 {
        coder.input_and_run("fmt.Println(a)").unwrap();
        assert_eq!(names(&coder), vec!["a"]);
        let program = toolchain.last_program();
        assert_eq!(program.matches("_Serialize(\"var-a\", a)").count(), 1);
        assert_eq!(program.matches("_Deserialize[int](\"var-a\")").count(), 1);
    }
}

#[test]
fn test_eviction_of_implicated_names() {
    let (_dir, toolchain, mut coder) = coder();
    coder.input_and_run("a := 1\nb := 2").unwrap();
    assert_eq!(names(&coder), vec!["a", "b"]);

    toolchain.then_fail_at(
        "x := a.Foo()",
        "a.Foo undefined (type int has no field or method Foo)",
    );
    assert!(coder.input_and_run("x := a.Foo()").is_err());
    assert_eq!(names(&coder), vec!["b"]);

    coder.input_and_run("fmt.Println(b)").unwrap();
    let program = toolchain.last_program();
    assert!(!program.contains("var-a"));
    assert!(program.contains("_Deserialize[int](\"var-b\")"));
}

#[test]
fn test_benign_failure_keeps_session() {
    let (_dir, toolchain, mut coder) = coder();
    coder.input_and_run("a := 1").unwrap();

    toolchain.then_fail_at("b := a", "no new variables on left side of :=");
    let err = coder.input_and_run("b := a").unwrap_err();
    assert!(err.is_benign());
    assert_eq!(names(&coder), vec!["a"]);
}

#[test]
fn test_stdout_kept_on_runtime_failure() {
    let (_dir, toolchain, mut coder) = coder();
    toolchain.then(|_| ProcessOutput {
        stdout: "before".to_string(),
        stderr: "panic: boom\n\ngoroutine 1 [running]:".to_string(),
        success: false,
    });
    match coder.input_and_run("fmt.Println(\"before\"); panic(\"boom\")") {
        Err(TurnError::Run { stdout, text, .. }) => {
            assert_eq!(stdout, "before");
            assert!(text.starts_with("panic: boom"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_stderr_on_clean_exit_fails_but_commits() {
    let (_dir, toolchain, mut coder) = coder();
    toolchain.then(|_| ProcessOutput {
        stdout: String::new(),
        stderr: "warning: deprecated call".to_string(),
        success: true,
    });
    match coder.input_and_run("a := 1") {
        Err(TurnError::Run { text, benign, .. }) => {
            assert_eq!(text, "warning: deprecated call");
            assert!(!benign);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(names(&coder), vec!["a"]);

    toolchain.then_ok("1");
    assert_eq!(coder.input_and_run("a").unwrap(), "1");
    assert!(toolchain
        .last_program()
        .contains("\ta, _ := _Deserialize[int](\"var-a\")\n"));
}

#[test]
fn test_only_last_display_survives() {
    let (_dir, toolchain, mut coder) = coder();
    coder
        .input_and_run("fmt.Println(1)\nx := 2\nfmt.Println(x)")
        .unwrap();
    let program = toolchain.last_program();
    assert!(!program.contains("fmt.Println(1)"));
    assert!(program.contains("fmt.Println(x)"));
}

#[test]
fn test_function_literal_is_replayed() {
    let (_dir, toolchain, mut coder) = coder();
    toolchain.with_type("double", "func(int) int");
    coder
        .input_and_run("double := func(x int) int { return x * 2 }")
        .unwrap();
    assert_eq!(names(&coder), vec!["double"]);
    assert!(coder.session().literal("double").is_some());

    toolchain.then_ok("42");
    assert_eq!(coder.input_and_run("double(21)").unwrap(), "42");
    let program = toolchain.last_program();
    assert!(program.contains("\tdouble := func(x int) int { return x * 2 }\n"));
    assert!(program.contains("fmt.Println(double(21))"));
    assert!(!program.contains("_Deserialize"));
    assert_eq!(
        coder.variables(),
        vec![("double".to_string(), "func literal".to_string())]
    );
}

#[test]
fn test_declarations_accumulate() {
    let (_dir, toolchain, mut coder) = coder();
    coder
        .input_and_run("func add(a, b int) int { return a + b }")
        .unwrap();
    assert_eq!(coder.session().declarations.len(), 1);

    toolchain.then_ok("3");
    assert_eq!(coder.input_and_run("add(1, 2)").unwrap(), "3");
    let program = toolchain.last_program();
    let decl = program.find("func add(a, b int) int").unwrap();
    let main = program.find("func main()").unwrap();
    assert!(decl < main);
    assert!(program.contains("fmt.Println(add(1, 2))"));
}

#[test]
fn test_redefinition_with_new_type() {
    let (_dir, toolchain, mut coder) = coder();
    coder.input_and_run("a := 1").unwrap();
    toolchain.with_type("a", "string");
    coder.input_and_run("a := \"hi\"").unwrap();
    let program = toolchain.last_program();
    assert!(!program.contains("_Deserialize[int]"));
    assert_eq!(coder.variables(), vec![("a".to_string(), "string".to_string())]);
}

#[test]
fn test_snapshot_resume() {
    let dir = TempDir::new().unwrap();
    let toolchain = FakeToolchain::default();
    {
        let mut coder = Coder::with_toolchain(config(dir.path()), toolchain.clone()).unwrap();
        coder.input_and_run("a := 1").unwrap();
    }
    let resumed = Coder::with_toolchain(config(dir.path()), toolchain).unwrap();
    assert_eq!(names(&resumed), vec!["a"]);
}

#[test]
fn test_reset() {
    let (_dir, _toolchain, mut coder) = coder();
    coder.input_and_run("a := 1").unwrap();
    coder.reset();
    assert!(names(&coder).is_empty());
    assert!(coder.variables().is_empty());
}

#[test]
fn test_run_file() {
    let (dir, toolchain, coder) = coder();
    let path = dir.path().join("hello.go");
    fs::write(&path, "package main\n\nfunc main() { println(\"hi\") }\n").unwrap();
    toolchain.then_ok("hi");
    assert_eq!(coder.run_file(&path).unwrap(), "hi");
    assert!(names(&coder).is_empty());
}

#[test]
fn test_completion() {
    let (_dir, _toolchain, mut coder) = coder();
    coder.input_and_run("total := 1").unwrap();
    let request = coder.completion_request("fmt.Println(to)", 14);
    assert_eq!(request.prefix, "to");
    assert!(request.program.contains("fmt.Println(to)"));
    let labels: Vec<String> = coder
        .complete("fmt.Println(to)", 14)
        .into_iter()
        .map(|i| i.label)
        .collect();
    assert_eq!(labels, vec!["total"]);
}
