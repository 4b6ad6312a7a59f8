use std::fs;

use docchat::history::{ConversationHistory, CONTEXT_TURNS, PERSISTED_TURNS};
use docchat::models::ConversationTurn;

fn turn(n: usize) -> ConversationTurn {
    ConversationTurn::new(format!("human {n}"), format!("assistant {n}")).unwrap()
}

#[test]
fn test_windows_after_many_appends() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("history.json");
    let mut history = ConversationHistory::load(&path);

    for n in 0..25 {
        history.append(turn(n)).unwrap();

        let expected_len = (n + 1).min(PERSISTED_TURNS);
        assert_eq!(history.len(), expected_len);
        assert_eq!(history.context_slice().len(), expected_len.min(CONTEXT_TURNS));
    }

    let reloaded = ConversationHistory::load(&path);
    assert_eq!(reloaded.len(), 10);
    assert_eq!(reloaded.turns().first(), Some(&turn(15)));
    assert_eq!(reloaded.last(), Some(&turn(24)));
    assert_eq!(reloaded.context_slice(), &reloaded.turns()[5..]);
}

#[test]
fn test_malformed_entry_is_discarded() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("history.json");
    fs::write(
        &path,
        r#"[{"human": "what is a trait?", "assistant": "Shared behaviour."}, {"human": 7}]"#,
    )
    .unwrap();

    let history = ConversationHistory::load(&path);

    assert_eq!(
        history.turns(),
        &[ConversationTurn::new("what is a trait?", "Shared behaviour.").unwrap()]
    );
}

#[test]
fn test_legacy_pairs_are_accepted() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("history.json");
    fs::write(&path, r#"[["old question", "old answer"], ["", "no question"]]"#).unwrap();

    let history = ConversationHistory::load(&path);

    assert_eq!(history.len(), 1);
    assert_eq!(history.last().unwrap().human, "old question");
}

#[test]
fn test_loaded_history_is_rewritten_in_object_form() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("history.json");
    fs::write(&path, r#"[["old question", "old answer"]]"#).unwrap();

    let mut history = ConversationHistory::load(&path);
    history.append(turn(1)).unwrap();

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved[0]["human"], "old question");
    assert_eq!(saved[1]["assistant"], "assistant 1");
}

#[test]
fn test_truncated_file_starts_empty_and_recovers() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("history.json");
    fs::write(&path, "[{\"human\": \"cut off").unwrap();

    let mut history = ConversationHistory::load(&path);
    assert!(history.is_empty());

    history.append(turn(0)).unwrap();
    assert_eq!(ConversationHistory::load(&path).len(), 1);
}

#[test]
fn test_oversized_file_is_trimmed_on_load() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("history.json");
    let turns: Vec<ConversationTurn> = (0..14).map(turn).collect();
    fs::write(&path, serde_json::to_string(&turns).unwrap()).unwrap();

    let history = ConversationHistory::load(&path);

    assert_eq!(history.len(), PERSISTED_TURNS);
    assert_eq!(history.turns()[0], turn(4));
}
