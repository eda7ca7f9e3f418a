//! End-to-end scenarios: load a script, pull events, check what the host
//! observes.

use pretty_assertions::assert_eq;

use spindle_runtime::{
    Dialogue, DialogueEvent, ExecutionState, Library, RuntimeError, SourceFormat, Value,
    SHUFFLE_OPTIONS,
};

fn dialogue_from(source: &str) -> Dialogue {
    let mut dialogue = Dialogue::new();
    dialogue
        .load_string(source, "test.yarn.txt", SourceFormat::Text)
        .expect("source should load");
    dialogue
}

/// Pulls events until the dialogue stops, panicking on option prompts.
fn run_to_end(dialogue: &mut Dialogue) -> Vec<DialogueEvent> {
    let mut events = Vec::new();
    while let Some(event) = dialogue.next_event().expect("no runtime error expected") {
        assert!(
            !matches!(event, DialogueEvent::Options(_)),
            "unexpected option prompt"
        );
        events.push(event);
    }
    events
}

fn line_texts(events: &[DialogueEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            DialogueEvent::Line { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn assignment_and_line() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "<<set $x to 23>>\n",
        "Hello\n",
        "===\n",
    ));

    dialogue.start().unwrap();
    let events = run_to_end(&mut dialogue);

    assert_eq!(line_texts(&events), vec!["Hello"]);
    assert_eq!(
        events.last(),
        Some(&DialogueEvent::NodeComplete { next_node: None })
    );
    assert_eq!(
        dialogue
            .storage()
            .get_value("$x")
            .expect("$x should be set")
            .as_number(),
        23.0
    );
}

#[test]
fn if_else_takes_the_true_branch() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "<<set $x to 5>>\n",
        "<<if $x > 3>>\n",
        "A\n",
        "<<else>>\n",
        "B\n",
        "<<endif>>\n",
        "===\n",
    ));

    dialogue.start().unwrap();
    let events = run_to_end(&mut dialogue);

    assert_eq!(line_texts(&events), vec!["A"]);
}

#[test]
fn inline_options_run_the_selected_branch() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "-> First\n",
        "    FirstBody\n",
        "-> Second\n",
        "    SecondBody\n",
        "===\n",
    ));

    dialogue.start().unwrap();

    let options = loop {
        match dialogue.next_event().unwrap().expect("should not stop yet") {
            DialogueEvent::Options(options) => break options,
            DialogueEvent::Line { .. } => panic!("no lines before the prompt"),
            _ => {}
        }
    };

    let labels: Vec<&str> = options.iter().map(|option| option.text.as_str()).collect();
    assert_eq!(labels, vec!["First", "Second"]);
    assert_eq!(dialogue.state(), ExecutionState::WaitingOnOptionSelection);

    dialogue.select_option(1).unwrap();
    let events = run_to_end(&mut dialogue);

    assert_eq!(line_texts(&events), vec!["SecondBody"]);
    assert_eq!(
        events.last(),
        Some(&DialogueEvent::NodeComplete { next_node: None })
    );
}

#[test]
fn conditional_options_are_filtered() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "<<set $ok to false>>\n",
        "-> Visible\n",
        "-> Hidden <<if $ok>>\n",
        "===\n",
    ));

    dialogue.start().unwrap();

    let options = loop {
        match dialogue.next_event().unwrap().expect("should not stop yet") {
            DialogueEvent::Options(options) => break options,
            _ => {}
        }
    };

    let labels: Vec<&str> = options.iter().map(|option| option.text.as_str()).collect();
    assert_eq!(labels, vec!["Visible"]);
}

#[test]
fn jump_options_complete_into_the_next_node() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "Pick\n",
        "[[Go east|East]]\n",
        "[[Go west|West]]\n",
        "===\n",
        "title: East\n",
        "---\n",
        "You went east\n",
        "===\n",
        "title: West\n",
        "---\n",
        "You went west\n",
        "===\n",
    ));

    dialogue.start().unwrap();

    let mut events = Vec::new();
    let options = loop {
        match dialogue.next_event().unwrap().expect("should not stop yet") {
            DialogueEvent::Options(options) => break options,
            event => events.push(event),
        }
    };

    assert_eq!(line_texts(&events), vec!["Pick"]);
    assert_eq!(options.len(), 2);

    dialogue.select_option(0).unwrap();
    let events = run_to_end(&mut dialogue);

    assert_eq!(
        events.first(),
        Some(&DialogueEvent::NodeComplete {
            next_node: Some("East".to_string())
        })
    );
    assert_eq!(line_texts(&events), vec!["You went east"]);
}

#[test]
fn bare_jump_runs_the_target_node() {
    let mut dialogue = dialogue_from(concat!(
        "title: A\n",
        "---\n",
        "[[B]]\n",
        "===\n",
        "title: B\n",
        "---\n",
        "In B\n",
        "===\n",
    ));

    dialogue.start_at("A").unwrap();
    let events = run_to_end(&mut dialogue);

    assert_eq!(
        events.first(),
        Some(&DialogueEvent::NodeComplete {
            next_node: Some("B".to_string())
        })
    );
    assert_eq!(line_texts(&events), vec!["In B"]);
    assert_eq!(
        events.last(),
        Some(&DialogueEvent::NodeComplete { next_node: None })
    );
}

#[test]
fn line_tags_pin_localisation_keys() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "Hello #line:greet\n",
        "===\n",
    ));

    let info = dialogue.string_info_table();
    assert_eq!(info["greet"].node_name, "Start");

    dialogue.start().unwrap();
    let events = run_to_end(&mut dialogue);
    match &events[0] {
        DialogueEvent::Line { id, text } => {
            assert_eq!(id, "greet");
            assert_eq!(text, "Hello");
        }
        other => panic!("expected a line, got {:?}", other),
    }
}

#[test]
fn empty_body_only_completes() {
    let mut dialogue = dialogue_from(concat!("title: Start\n", "---\n", "===\n"));

    dialogue.start().unwrap();
    let events = run_to_end(&mut dialogue);

    assert_eq!(
        events,
        vec![DialogueEvent::NodeComplete { next_node: None }]
    );
}

#[test]
fn raw_text_nodes_intern_but_do_not_run() {
    let mut dialogue = dialogue_from(concat!(
        "title: Notes\n",
        "tags: rawText\n",
        "---\n",
        "first line\n",
        "second line\n",
        "===\n",
    ));

    assert_eq!(
        dialogue.text_for_node("Notes").as_deref(),
        Some("first line\nsecond line")
    );

    match dialogue.start_at("Notes") {
        Err(RuntimeError::RawTextNode { name }) => assert_eq!(name, "Notes"),
        other => panic!("expected raw-text error, got {:?}", other),
    }
}

#[test]
fn division_by_zero_is_not_fatal() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "<<set $x to 1 / 0>>\n",
        "===\n",
    ));

    dialogue.start().unwrap();
    run_to_end(&mut dialogue);

    assert!(dialogue
        .storage()
        .get_value("$x")
        .expect("$x should be set")
        .as_number()
        .is_infinite());
}

#[test]
fn visit_counts_increment_on_completion() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "<<if visited(\"Start\")>>\n",
        "Again\n",
        "<<else>>\n",
        "FirstTime\n",
        "<<endif>>\n",
        "===\n",
    ));

    dialogue.start().unwrap();
    let events = run_to_end(&mut dialogue);
    assert_eq!(line_texts(&events), vec!["FirstTime"]);
    assert_eq!(dialogue.visit_count("Start"), 1);

    dialogue.start().unwrap();
    let events = run_to_end(&mut dialogue);
    assert_eq!(line_texts(&events), vec!["Again"]);
    assert_eq!(dialogue.visit_count("Start"), 2);
}

#[test]
fn visit_count_of_unknown_node_is_zero() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "<<set $c to visitCount(\"Nowhere\")>>\n",
        "===\n",
    ));

    dialogue.start().unwrap();
    run_to_end(&mut dialogue);

    assert_eq!(
        dialogue.storage().get_value("$c"),
        Some(Value::Number(0.0))
    );
}

#[test]
fn shuffle_command_arms_the_reserved_variable() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "<<shuffleNextOptions>>\n",
        "-> A\n",
        "-> B\n",
        "===\n",
    ));

    dialogue.start().unwrap();

    loop {
        match dialogue.next_event().unwrap().expect("should not stop yet") {
            DialogueEvent::Options(_) => break,
            _ => {}
        }
    }

    // Hosts read the reserved variable while presenting the prompt.
    assert_eq!(
        dialogue.storage().get_value(SHUFFLE_OPTIONS),
        Some(Value::Bool(true))
    );

    dialogue.select_option(0).unwrap();
    run_to_end(&mut dialogue);

    assert_eq!(
        dialogue.storage().get_value(SHUFFLE_OPTIONS),
        Some(Value::Bool(false))
    );
}

#[test]
fn continuing_without_selection_is_an_error() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "-> A\n",
        "-> B\n",
        "===\n",
    ));

    dialogue.start().unwrap();

    loop {
        match dialogue.next_event().unwrap().expect("should not stop yet") {
            DialogueEvent::Options(_) => break,
            _ => {}
        }
    }

    assert!(matches!(
        dialogue.next_event(),
        Err(RuntimeError::WaitingForOption)
    ));

    assert!(matches!(
        dialogue.select_option(7),
        Err(RuntimeError::InvalidOption { index: 7, count: 2 })
    ));
}

#[test]
fn stop_command_ends_the_dialogue() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "Before\n",
        "<<stop>>\n",
        "After\n",
        "===\n",
    ));

    dialogue.start().unwrap();
    let events = run_to_end(&mut dialogue);

    assert_eq!(line_texts(&events), vec!["Before"]);
}

#[test]
fn missing_variables_read_as_null() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "<<if $never_set>>\n",
        "Seen\n",
        "<<else>>\n",
        "Unseen\n",
        "<<endif>>\n",
        "===\n",
    ));

    dialogue.start().unwrap();
    let events = run_to_end(&mut dialogue);
    assert_eq!(line_texts(&events), vec!["Unseen"]);
}

#[test]
fn compiled_round_trip_preserves_behavior() {
    let source = concat!(
        "title: Start\n",
        "---\n",
        "Hello #line:greet\n",
        "<<set $x to 2 * 21>>\n",
        "===\n",
    );

    let mut original = dialogue_from(source);
    let bytes = original
        .save_compiled()
        .expect("a program is loaded")
        .expect("save should succeed");

    let mut reloaded = Dialogue::new();
    reloaded.load_compiled(&bytes).unwrap();

    original.start().unwrap();
    let original_events = run_to_end(&mut original);

    reloaded.start().unwrap();
    let reloaded_events = run_to_end(&mut reloaded);

    assert_eq!(original_events, reloaded_events);
    assert_eq!(
        reloaded.storage().get_value("$x"),
        Some(Value::Number(42.0))
    );

    // Localisation context is not carried by the container.
    assert!(reloaded.string_info_table().is_empty());
}

#[test]
fn loading_order_does_not_matter_for_disjoint_files() {
    let a = "title: A\n---\nFrom A\n===\n";
    let b = "title: B\n---\nFrom B\n===\n";

    let library = Library::standard_library();
    let mut ab = spindle_runtime::load_string(a, "a", SourceFormat::Text, &library).unwrap();
    ab.merge(spindle_runtime::load_string(b, "b", SourceFormat::Text, &library).unwrap())
        .unwrap();

    let mut ba = spindle_runtime::load_string(b, "b", SourceFormat::Text, &library).unwrap();
    ba.merge(spindle_runtime::load_string(a, "a", SourceFormat::Text, &library).unwrap())
        .unwrap();

    assert_eq!(ab, ba);
}

#[test]
fn colliding_loads_fail_and_leave_the_program_intact() {
    let mut dialogue = dialogue_from("title: Start\n---\nOriginal\n===\n");

    let err = dialogue
        .load_string(
            "title: Start\n---\nReplacement\n===\n",
            "other.yarn.txt",
            SourceFormat::Text,
        )
        .unwrap_err();
    assert!(err.to_string().contains("already defined"));

    dialogue.start().unwrap();
    let events = run_to_end(&mut dialogue);
    assert_eq!(line_texts(&events), vec!["Original"]);
}

#[test]
fn nested_shortcut_groups_run() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "-> Outer\n",
        "    -> Inner\n",
        "        Deep\n",
        "-> Other\n",
        "===\n",
    ));

    dialogue.start().unwrap();

    loop {
        match dialogue.next_event().unwrap().expect("should not stop yet") {
            DialogueEvent::Options(options) => {
                assert_eq!(options.len(), 2);
                break;
            }
            _ => {}
        }
    }
    dialogue.select_option(0).unwrap();

    loop {
        match dialogue.next_event().unwrap().expect("should not stop yet") {
            DialogueEvent::Options(options) => {
                assert_eq!(options.len(), 1);
                assert_eq!(options[0].text, "Inner");
                break;
            }
            _ => {}
        }
    }
    dialogue.select_option(0).unwrap();

    let events = run_to_end(&mut dialogue);
    assert_eq!(line_texts(&events), vec!["Deep"]);
}

#[test]
fn string_concatenation_and_comparisons() {
    let mut dialogue = dialogue_from(concat!(
        "title: Start\n",
        "---\n",
        "<<set $name to \"world\">>\n",
        "<<set $greeting to \"hello \" + $name>>\n",
        "<<set $same to $greeting == \"hello world\">>\n",
        "===\n",
    ));

    dialogue.start().unwrap();
    run_to_end(&mut dialogue);

    assert_eq!(
        dialogue.storage().get_value("$greeting"),
        Some(Value::from("hello world"))
    );
    assert_eq!(
        dialogue.storage().get_value("$same"),
        Some(Value::Bool(true))
    );
}
