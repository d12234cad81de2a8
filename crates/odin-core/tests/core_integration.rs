#![allow(clippy::unwrap_used, clippy::expect_used)]

use odin_core::*;

// ---------------------------------------------------------------------------
// 1. Conversions from library errors keep their source message
// ---------------------------------------------------------------------------

#[test]
fn json_error_converts_with_question_mark() {
    fn parse(raw: &str) -> OdinResult<serde_json::Value> {
        Ok(serde_json::from_str(raw)?)
    }

    let err = parse("{not json").unwrap_err();
    assert!(matches!(err, OdinError::Json(_)));
    assert!(err.to_string().starts_with("JSON error:"));
}

#[test]
fn io_error_converts_with_question_mark() {
    fn read() -> OdinResult<String> {
        Ok(std::fs::read_to_string("/definitely/not/here/odin.toml")?)
    }

    assert!(matches!(read().unwrap_err(), OdinError::Io(_)));
}

// ---------------------------------------------------------------------------
// 2. Routing and admission errors name the offending key
// ---------------------------------------------------------------------------

#[test]
fn admission_errors_name_the_task() {
    assert_eq!(
        OdinError::DuplicateTask("t-42".into()).to_string(),
        "task already tracked: t-42"
    );
    assert_eq!(
        OdinError::DependencyCycle("t-7".into()).to_string(),
        "dependency cycle detected at task: t-7"
    );
    let failure = OdinError::TaskPermanentFailure {
        task_id: "t-9".into(),
        reason: "worker crashed".into(),
    };
    assert_eq!(failure.to_string(), "task t-9 failed permanently: worker crashed");
}
