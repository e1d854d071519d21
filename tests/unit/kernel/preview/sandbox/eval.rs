use super::*;
use crate::kernel::preview::bridge::console_channel;
use crate::models::ConsoleRecord;
use serde_json::json;

fn run(source: &str) -> (ScriptOutcome, Vec<ConsoleRecord>) {
    let (tx, mut rx) = console_channel("t");
    let outcome = run_script(tree_sitter_javascript::language(), source, "app.js", &tx);
    (outcome, rx.drain())
}

#[test]
fn test_replays_console_calls_in_order() {
    let (outcome, records) = run("console.log('hi');\nconsole.warn(\"w\", 2);\nconsole.info(true, null);");

    assert_eq!(outcome, ScriptOutcome::Completed);
    assert_eq!(records.len(), 3);
    assert_eq!(records[0], ConsoleRecord::new(ConsoleLevel::Log, vec![json!("hi")]));
    assert_eq!(records[1].level, ConsoleLevel::Warn);
    assert_eq!(records[1].args, vec![json!("w"), json!(2)]);
    assert_eq!(records[2].args, vec![json!(true), json!(null)]);
}

#[test]
fn test_evaluates_constants_and_expressions() {
    let source = r#"
const name = "zed";
let count = 2 * 3;
console.log(`hello ${name}!`, count + 1, "n=" + count);
console.log({ a: 1, b: [1, 2] }, -count, !count);
console.log(count > 5 ? "big" : "small");
"#;
    let (_, records) = run(source);

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].args, vec![json!("hello zed!"), json!(7), json!("n=6")]);
    assert_eq!(
        records[1].args,
        vec![json!({"a": 1, "b": [1, 2]}), json!(-6), json!(false)]
    );
    assert_eq!(records[2].args, vec![json!("big")]);
}

#[test]
fn test_skips_calls_with_dynamic_arguments() {
    let (outcome, records) = run("console.log(document.title);\nconsole.log('after');");

    assert_eq!(outcome, ScriptOutcome::Completed);
    assert_eq!(records, vec![ConsoleRecord::new(ConsoleLevel::Log, vec![json!("after")])]);
}

#[test]
fn test_throw_reports_uncaught_error_and_stops() {
    let (outcome, records) = run("console.log('before');\nthrow new Error(\"boom\");\nconsole.log('never');");

    assert_eq!(outcome, ScriptOutcome::Threw);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].level, ConsoleLevel::Error);
    assert_eq!(records[1].args, vec![json!("Uncaught Error: boom (app.js:2)")]);
}

#[test]
fn test_throw_of_plain_value() {
    let (_, records) = run("throw 'bad';");
    assert_eq!(records[0].args, vec![json!("Uncaught bad (app.js:1)")]);
}

#[test]
fn test_syntax_error_is_reported_once() {
    let (outcome, records) = run("console.log('a');\nconsole.log(;");

    assert_eq!(outcome, ScriptOutcome::SyntaxError);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, ConsoleLevel::Error);
    let message = records[0].display_args();
    assert!(message.starts_with("Uncaught SyntaxError: Unexpected token (app.js:"));
}

#[test]
fn test_console_clear() {
    let (_, records) = run("console.log(1); console.clear();");
    assert_eq!(records.last(), Some(&ConsoleRecord::clear()));
}

#[test]
fn test_unescape_js() {
    assert_eq!(unescape_js(r"a\nb"), "a\nb");
    assert_eq!(unescape_js(r"\x41B\u{43}"), "ABC");
    assert_eq!(unescape_js(r#"\"q\""#), "\"q\"");
}

#[test]
fn test_to_js_string() {
    assert_eq!(to_js_string(&json!(1.5)), "1.5");
    assert_eq!(to_js_string(&json!([1, null, "x"])), "1,,x");
    assert_eq!(to_js_string(&json!({"a": 1})), "[object Object]");
}

#[test]
fn test_reassigned_bindings_are_not_replayed_stale() {
    let source = "let x = 1;\nx = 2;\nconsole.log(x);\nlet i = 0;\ni++;\nconsole.log(i);\nlet n = 1;\nn += 4;\nconsole.log('n', n);\nconsole.log('done');";
    let (_, records) = run(source);

    assert_eq!(records, vec![ConsoleRecord::new(ConsoleLevel::Log, vec![json!("done")])]);
}

#[test]
fn test_assignments_inside_blocks_invalidate_bindings() {
    let (_, records) = run("let x = 1;\nif (ready) { x = 2; }\nconsole.log(x);\nconsole.log('end');");
    assert_eq!(records, vec![ConsoleRecord::new(ConsoleLevel::Log, vec![json!("end")])]);
}

#[test]
fn test_calls_keep_only_constant_primitives() {
    let source = "const label = 'L';\nlet count = 1;\nconst items = [1];\nupdate();\nconsole.log(label);\nconsole.log(count);\nconsole.log(items);";
    let (_, records) = run(source);

    assert_eq!(records, vec![ConsoleRecord::new(ConsoleLevel::Log, vec![json!("L")])]);
}

#[test]
fn test_member_mutation_invalidates_object() {
    let (_, records) = run("const o = { a: 1 };\no.a = 2;\nconsole.log(o);\nconsole.log('ok');");
    assert_eq!(records, vec![ConsoleRecord::new(ConsoleLevel::Log, vec![json!("ok")])]);
}

#[test]
fn test_undefined_is_falsy_and_nullish() {
    let (_, records) = run(
        "console.log(undefined ? 'yes' : 'no', undefined ?? 'dflt', !undefined, undefined);\nlet unset;\nconsole.log(unset ?? 'fallback', `v=${unset}`);",
    );

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].args,
        vec![json!("no"), json!("dflt"), json!(true), json!("undefined")]
    );
    assert_eq!(records[1].args, vec![json!("fallback"), json!("v=undefined")]);
}

#[test]
fn test_loose_and_strict_equality() {
    let (_, records) = run(
        "console.log(1 == '1', null == undefined, 1 === '1', null === undefined, 0 == false, 'a' != 'b', undefined == 0);",
    );

    assert_eq!(
        records[0].args,
        vec![
            json!(true),
            json!(true),
            json!(false),
            json!(false),
            json!(true),
            json!(true),
            json!(false)
        ]
    );
}

#[test]
fn test_unrepresentable_results_are_skipped() {
    let (_, records) = run("console.log(undefined + 1);\nconsole.log([1, undefined]);\nconsole.log({} === {});\nconsole.log(1 / 0);\nconsole.log('last');");
    assert_eq!(records, vec![ConsoleRecord::new(ConsoleLevel::Log, vec![json!("last")])]);
}
