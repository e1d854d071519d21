use super::*;
use serde_json::json;

#[test]
fn test_clear_empties_buffer() {
    let mut buffer = ConsoleBuffer::new();
    for i in 0..25 {
        buffer.push(ConsoleRecord::new(ConsoleLevel::Log, vec![json!(i)]));
    }
    buffer.push(ConsoleRecord::new(ConsoleLevel::Error, vec![json!("boom")]));
    assert_eq!(buffer.len(), 26);

    buffer.push(ConsoleRecord::clear());
    assert!(buffer.is_empty());

    buffer.push(ConsoleRecord::clear());
    assert!(buffer.is_empty());
}

#[test]
fn test_push_preserves_arrival_order() {
    let mut buffer = ConsoleBuffer::new();
    buffer.push(ConsoleRecord::new(ConsoleLevel::Info, vec![json!("first")]));
    buffer.push(ConsoleRecord::new(ConsoleLevel::Warn, vec![json!("second")]));
    buffer.push(ConsoleRecord::new(ConsoleLevel::Info, vec![json!("first")]));

    let levels: Vec<ConsoleLevel> = buffer.records().iter().map(|r| r.level).collect();
    assert_eq!(
        levels,
        vec![ConsoleLevel::Info, ConsoleLevel::Warn, ConsoleLevel::Info]
    );
}

#[test]
fn test_display_args() {
    let record = ConsoleRecord::new(
        ConsoleLevel::Log,
        vec![json!("count"), json!(3), json!({"a": [1, 2]})],
    );
    assert_eq!(record.display_args(), r#"count 3 {"a":[1,2]}"#);
}

#[test]
fn test_level_serde_is_lowercase() {
    let record = ConsoleRecord::new(ConsoleLevel::Warn, vec![json!("x")]);
    let text = serde_json::to_string(&record).unwrap();
    assert_eq!(text, r#"{"level":"warn","args":["x"]}"#);
    assert_eq!(ConsoleLevel::from_name("system"), Some(ConsoleLevel::System));
    assert_eq!(ConsoleLevel::from_name("debug"), None);
}
