//! End-to-end dispatch and suggestion tests against a built tree.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use decli_core::argument::{ArgumentKind, EnumTable, InternalArgument};
use decli_core::declare::{LeafDeclaration, NamedInput, ParameterDeclaration, RequirementDeclaration};
use decli_core::registry::ArgumentResolver;
use decli_core::sender::PermissionAdapter;
use decli_core::suggestion::Suggestion;
use decli_core::value::{ArgValue, DeclaredType, arg_value};
use decli_core::{
    CommandEngine, Flag, KeyedArguments, MessageContext, MessageKey, NamedArg,
    ParentDeclaration, RequirementKey, SuggestionKey, SuggestionMethod,
};

fn tokens(input: &[&str]) -> Vec<String> {
    input.iter().map(|token| token.to_string()).collect()
}

type Messages = Arc<Mutex<Vec<String>>>;

/// Captures every reserved message as a short tag for assertions.
fn capture_messages<S: 'static>(engine: &mut CommandEngine<S>) -> Messages {
    let messages: Messages = Arc::default();
    for key in [
        MessageKey::UNKNOWN_COMMAND,
        MessageKey::TOO_MANY_ARGUMENTS,
        MessageKey::NOT_ENOUGH_ARGUMENTS,
        MessageKey::INVALID_ARGUMENT,
    ] {
        let log = Arc::clone(&messages);
        let name = key.name().to_string();
        engine.register_message(key, move |_, context| {
            let detail = match context {
                MessageContext::InvalidCommand { command } => command.clone(),
                MessageContext::Syntax { command, .. } => command.clone(),
                MessageContext::InvalidArgument { input, .. } => input.clone(),
            };
            log.lock().unwrap().push(format!("{name}:{detail}"));
        });
    }
    messages
}

#[test]
fn leaf_dispatch_and_unknown_child() {
    let calls: Arc<Mutex<u32>> = Arc::default();
    let counter = Arc::clone(&calls);

    let mut engine: CommandEngine<()> = CommandEngine::new();
    let messages = capture_messages(&mut engine);
    engine
        .register(
            ParentDeclaration::new("root").leaf(LeafDeclaration::new("help", move |_, _| {
                *counter.lock().unwrap() += 1;
                Ok(())
            })),
        )
        .unwrap();

    engine.execute(&(), &tokens(&["root", "help"])).unwrap();
    assert_eq!(*calls.lock().unwrap(), 1);
    assert!(messages.lock().unwrap().is_empty());

    engine.execute(&(), &tokens(&["root", "helm"])).unwrap();
    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(
        messages.lock().unwrap().as_slice(),
        ["unknown-command:helm"]
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Material {
    Stone,
    Wood,
}

fn give_engine() -> (CommandEngine<()>, Arc<Mutex<Vec<(Material, Option<i32>)>>>, Messages) {
    let given: Arc<Mutex<Vec<(Material, Option<i32>)>>> = Arc::default();
    let log = Arc::clone(&given);

    let mut engine: CommandEngine<()> = CommandEngine::new();
    let messages = capture_messages(&mut engine);
    engine
        .register(
            ParentDeclaration::new("root").leaf(
                LeafDeclaration::new("give", move |_, mut invocation| {
                    let material = invocation.take::<Material>(0).unwrap();
                    let amount = invocation.take::<i32>(1);
                    log.lock().unwrap().push((material, amount));
                    Ok(())
                })
                .parameter(ParameterDeclaration::enumeration(
                    "material",
                    EnumTable::new([("STONE", Material::Stone), ("WOOD", Material::Wood)]),
                ))
                .parameter(ParameterDeclaration::of::<i32>("amount").optional()),
            ),
        )
        .unwrap();
    (engine, given, messages)
}

#[test]
fn optional_parameter_fills_with_none() {
    let (engine, given, messages) = give_engine();

    engine.execute(&(), &tokens(&["root", "give", "stone"])).unwrap();
    engine
        .execute(&(), &tokens(&["root", "give", "STONE", "64"]))
        .unwrap();

    assert_eq!(
        given.lock().unwrap().as_slice(),
        [(Material::Stone, None), (Material::Stone, Some(64))]
    );
    assert!(messages.lock().unwrap().is_empty());
}

#[test]
fn trailing_tokens_are_too_many() {
    let (engine, given, messages) = give_engine();

    engine
        .execute(&(), &tokens(&["root", "give", "wood", "64", "extra"]))
        .unwrap();

    assert!(given.lock().unwrap().is_empty());
    assert_eq!(
        messages.lock().unwrap().as_slice(),
        ["too-many-arguments:give"]
    );
}

#[test]
fn unresolvable_value_is_invalid_argument() {
    let (engine, given, messages) = give_engine();

    engine.execute(&(), &tokens(&["root", "give", "iron"])).unwrap();

    assert!(given.lock().unwrap().is_empty());
    assert_eq!(messages.lock().unwrap().as_slice(), ["invalid-argument:iron"]);
}

fn keyed_engine() -> (CommandEngine<()>, Arc<Mutex<Vec<KeyedArguments>>>) {
    let seen: Arc<Mutex<Vec<KeyedArguments>>> = Arc::default();
    let log = Arc::clone(&seen);

    let mut engine: CommandEngine<()> = CommandEngine::new();
    engine.register_suggestion(
        SuggestionKey::of("paths"),
        SuggestionMethod::StartsWith,
        |_, _| vec!["/tmp/x".into(), "/tmp/y".into()],
    );
    engine
        .register(
            ParentDeclaration::new("root").leaf(
                LeafDeclaration::new("cmd", move |_, mut invocation| {
                    let keyed = invocation.take::<KeyedArguments>(0).unwrap();
                    log.lock().unwrap().push(keyed);
                    Ok(())
                })
                .parameter(
                    ParameterDeclaration::keyed("k")
                        .flags(vec![
                            Flag::short("v").long("verbose").build(),
                            Flag::short("o").long("out").argument::<String>().build(),
                        ])
                        .named(vec![NamedArg::of::<String>("path")
                            .suggestion(SuggestionKey::of("paths"))
                            .build()]),
                ),
            ),
        )
        .unwrap();
    (engine, seen)
}

#[test]
fn keyed_parameter_splits_flags_named_and_leftover() {
    let (engine, seen) = keyed_engine();

    engine
        .execute(
            &(),
            &tokens(&["root", "cmd", "path:/tmp/x", "-v", "--out=/tmp/y", "rest", "text"]),
        )
        .unwrap();

    let seen = seen.lock().unwrap();
    let keyed = seen.first().expect("target invoked");
    assert_eq!(keyed.argument::<String>("path").as_deref(), Some("/tmp/x"));
    assert!(keyed.has_flag("v"));
    assert!(keyed.has_flag("verbose"));
    assert_eq!(keyed.flag_value::<String>("out").as_deref(), Some("/tmp/y"));
    assert_eq!(keyed.text(), "rest text");
}

#[test]
fn unknown_named_pair_becomes_leftover() {
    let (engine, seen) = keyed_engine();

    engine
        .execute(&(), &tokens(&["root", "cmd", "size:10", "hello"]))
        .unwrap();

    let seen = seen.lock().unwrap();
    let keyed = seen.first().expect("target invoked");
    assert!(!keyed.has_arguments());
    assert_eq!(keyed.text(), "size:10 hello");
}

#[test]
fn keyed_suggestions_follow_parser_state() {
    let (engine, _) = keyed_engine();

    assert_eq!(engine.suggest(&(), &tokens(&["root", "cmd", "p"])), ["path:"]);

    assert_eq!(
        engine.suggest(&(), &tokens(&["root", "cmd", "path:/tm"])),
        ["path:/tmp/x", "path:/tmp/y"]
    );

    let mut long_flags = engine.suggest(&(), &tokens(&["root", "cmd", "--"]));
    long_flags.sort();
    assert_eq!(long_flags, ["--out", "--verbose"]);

    let mut short_flags = engine.suggest(&(), &tokens(&["root", "cmd", "-"]));
    short_flags.sort();
    assert_eq!(short_flags, ["-o", "-v"]);
}

#[test]
fn flag_payload_missing_at_end_of_input() {
    let seen: Arc<Mutex<Vec<KeyedArguments>>> = Arc::default();
    let log = Arc::clone(&seen);

    let mut engine: CommandEngine<()> = CommandEngine::new();
    let messages = capture_messages(&mut engine);
    engine
        .register(
            ParentDeclaration::new("root").leaf(
                LeafDeclaration::new("cmd", move |_, mut invocation| {
                    log.lock()
                        .unwrap()
                        .push(invocation.take::<KeyedArguments>(0).unwrap());
                    Ok(())
                })
                .parameter(ParameterDeclaration::keyed("k").flags(vec![
                    Flag::short("o").long("out").argument::<String>().build(),
                    Flag::short("n").long("num").argument::<i32>().build(),
                ])),
            ),
        )
        .unwrap();

    // A typed payload left empty at the end of input fails to resolve.
    engine.execute(&(), &tokens(&["root", "cmd", "-n"])).unwrap();
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(messages.lock().unwrap().as_slice(), ["invalid-argument:"]);

    // A string payload takes the empty value as-is.
    engine.execute(&(), &tokens(&["root", "cmd", "-o"])).unwrap();
    let seen = seen.lock().unwrap();
    let keyed = seen.first().expect("target invoked");
    assert_eq!(keyed.flag_raw("out"), Some(""));
    assert_eq!(keyed.flag_value::<String>("out").as_deref(), Some(""));
}

#[test]
fn split_collection_resolves_and_rejects_empty_pieces() {
    let seen: Arc<Mutex<Vec<Vec<i32>>>> = Arc::default();
    let log = Arc::clone(&seen);

    let mut engine: CommandEngine<()> = CommandEngine::new();
    let messages = capture_messages(&mut engine);
    engine
        .register(
            ParentDeclaration::new("root").leaf(
                LeafDeclaration::new("nums", move |_, mut invocation| {
                    let values = invocation.take::<Vec<ArgValue>>(0).unwrap();
                    let values: Vec<i32> = values
                        .into_iter()
                        .map(|value| *value.downcast::<i32>().unwrap())
                        .collect();
                    log.lock().unwrap().push(values);
                    Ok(())
                })
                .parameter(ParameterDeclaration::split_list_of::<i32>("values")),
            ),
        )
        .unwrap();

    engine.execute(&(), &tokens(&["root", "nums", "1,2,3"])).unwrap();
    assert_eq!(seen.lock().unwrap().as_slice(), [vec![1, 2, 3]]);

    engine.execute(&(), &tokens(&["root", "nums", "1,,3"])).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(messages.lock().unwrap().as_slice(), ["invalid-argument:"]);
}

#[test]
fn parent_argument_joins_leaf_scope() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let log = Arc::clone(&seen);

    let mut engine: CommandEngine<()> = CommandEngine::new();
    let messages = capture_messages(&mut engine);
    engine
        .register(
            ParentDeclaration::new("root").parent(
                ParentDeclaration::new("group")
                    .argument(ParameterDeclaration::of::<String>("name"))
                    .leaf(LeafDeclaration::new("list", move |_, mut invocation| {
                        log.lock()
                            .unwrap()
                            .push(invocation.take_scope::<String>(0).unwrap());
                        Ok(())
                    })),
            ),
        )
        .unwrap();

    engine
        .execute(&(), &tokens(&["root", "group", "alpha", "list"]))
        .unwrap();
    assert_eq!(seen.lock().unwrap().as_slice(), ["alpha"]);

    // The head after a parent argument is the argument, not a child name:
    // "list" is consumed as the name and nothing further is dispatched.
    engine.execute(&(), &tokens(&["root", "group", "list"])).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert!(messages.lock().unwrap().is_empty());
}

#[test]
fn default_leaf_takes_unmatched_tokens() {
    let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::default();
    let log = Arc::clone(&seen);

    let mut engine: CommandEngine<()> = CommandEngine::new();
    engine
        .register(
            ParentDeclaration::new("root").leaf(
                LeafDeclaration::default(move |_, mut invocation| {
                    log.lock().unwrap().push(invocation.take::<String>(0));
                    Ok(())
                })
                .parameter(ParameterDeclaration::of::<String>("what").optional()),
            ),
        )
        .unwrap();

    engine.execute(&(), &tokens(&["root"])).unwrap();
    engine.execute(&(), &tokens(&["root", "thing"])).unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        [None, Some("thing".to_string())]
    );
}

#[test]
fn requirements_gate_execution_per_sender() {
    let calls: Arc<Mutex<u32>> = Arc::default();
    let counter = Arc::clone(&calls);
    let denials: Arc<Mutex<u32>> = Arc::default();
    let denied = Arc::clone(&denials);

    let mut engine: CommandEngine<String> = CommandEngine::new();
    engine.register_requirement(RequirementKey::of("admin"), |sender: &String, _| {
        sender == "admin"
    });
    engine.register_message(MessageKey::of("no-access"), move |_, _| {
        *denied.lock().unwrap() += 1;
    });
    engine
        .register(
            ParentDeclaration::new("ban").leaf(
                LeafDeclaration::default(move |_, _| {
                    *counter.lock().unwrap() += 1;
                    Ok(())
                })
                .requirement(RequirementDeclaration::new(
                    RequirementKey::of("admin"),
                    MessageKey::of("no-access"),
                )),
            ),
        )
        .unwrap();

    engine.execute(&"admin".to_string(), &tokens(&["ban"])).unwrap();
    engine.execute(&"guest".to_string(), &tokens(&["ban"])).unwrap();

    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(*denials.lock().unwrap(), 1);
}

#[test]
fn target_errors_propagate_with_the_command_name() {
    let mut engine: CommandEngine<()> = CommandEngine::new();
    engine
        .register(ParentDeclaration::new("boom").leaf(LeafDeclaration::default(
            |_, _| Err(anyhow::anyhow!("storage offline")),
        )))
        .unwrap();

    let error = engine.execute(&(), &tokens(&["boom"])).unwrap_err();
    assert!(error.to_string().contains("boom"));
}

#[test]
fn empty_stream_is_a_silent_no_op() {
    let mut engine: CommandEngine<()> = CommandEngine::new();
    let messages = capture_messages(&mut engine);

    engine.execute(&(), &[]).unwrap();
    assert!(messages.lock().unwrap().is_empty());
}

#[test]
fn execute_named_fills_limitless_from_one_string() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let log = Arc::clone(&seen);

    let mut engine: CommandEngine<()> = CommandEngine::new();
    engine
        .register(
            ParentDeclaration::new("say").leaf(
                LeafDeclaration::default(move |_, mut invocation| {
                    log.lock().unwrap().push(invocation.take::<String>(0).unwrap());
                    Ok(())
                })
                .parameter(ParameterDeclaration::joined("message")),
            ),
        )
        .unwrap();

    let arguments: HashMap<String, NamedInput> =
        [("message".to_string(), NamedInput::raw("hello there"))].into();
    engine.execute_named(&(), &["say"], arguments).unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), ["hello there"]);
}

#[test]
fn suggestions_descend_through_parents() {
    let mut engine: CommandEngine<()> = CommandEngine::new();
    engine
        .register(
            ParentDeclaration::new("root")
                .leaf(LeafDeclaration::new("give", |_, _| Ok(())).parameter(
                    ParameterDeclaration::enumeration(
                        "material",
                        EnumTable::new([("STONE", Material::Stone), ("WOOD", Material::Wood)]),
                    ),
                ))
                .leaf(LeafDeclaration::new("gamemode", |_, _| Ok(()))),
        )
        .unwrap();

    let mut children = engine.suggest(&(), &tokens(&["root", "g"]));
    children.sort();
    assert_eq!(children, ["gamemode", "give"]);

    assert_eq!(
        engine.suggest(&(), &tokens(&["root", "give", "st"])),
        ["stone"]
    );
}

#[test]
fn custom_type_factory_builds_its_own_argument() {
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Level(u8);

    let seen: Arc<Mutex<Vec<Level>>> = Arc::default();
    let log = Arc::clone(&seen);

    let mut engine: CommandEngine<()> = CommandEngine::new();
    let messages = capture_messages(&mut engine);
    engine.register_argument_factory::<Level>(|spec| {
        let resolver: ArgumentResolver<()> = Arc::new(|_, input| match input {
            "low" => Some(arg_value(Level(0))),
            "high" => Some(arg_value(Level(2))),
            _ => None,
        });
        InternalArgument::new(
            spec.name,
            spec.description,
            DeclaredType::of::<Level>(),
            spec.optional,
            Suggestion::Static(
                vec!["low".into(), "high".into()],
                SuggestionMethod::StartsWith,
            ),
            ArgumentKind::Single { resolver },
        )
    });
    engine
        .register(
            ParentDeclaration::new("alarm").leaf(
                LeafDeclaration::new("set", move |_, mut invocation| {
                    log.lock().unwrap().push(invocation.take::<Level>(0).unwrap());
                    Ok(())
                })
                .parameter(ParameterDeclaration::of::<Level>("level")),
            ),
        )
        .unwrap();

    engine.execute(&(), &tokens(&["alarm", "set", "high"])).unwrap();
    assert_eq!(seen.lock().unwrap().as_slice(), [Level(2)]);

    // Suggestions come from the factory-built argument.
    assert_eq!(engine.suggest(&(), &tokens(&["alarm", "set", "l"])), ["low"]);

    engine.execute(&(), &tokens(&["alarm", "set", "mid"])).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(messages.lock().unwrap().as_slice(), ["invalid-argument:mid"]);
}

#[test]
fn permission_adapter_gets_full_syntax_and_inherited_nodes() {
    struct Recorder(Arc<Mutex<Vec<(String, String)>>>);

    impl PermissionAdapter for Recorder {
        fn register(&self, command: &str, permission: &str) {
            self.0
                .lock()
                .unwrap()
                .push((command.to_string(), permission.to_string()));
        }
    }

    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::default();
    let mut engine: CommandEngine<()> = CommandEngine::new();
    engine.set_permission_adapter(Recorder(Arc::clone(&seen)));
    engine
        .register(
            ParentDeclaration::new("admin").permission("admin.use").leaf(
                LeafDeclaration::new("ban", |_, _| Ok(()))
                    .permission("admin.ban")
                    .parameter(ParameterDeclaration::of::<String>("player")),
            ),
        )
        .unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        [
            ("/admin".to_string(), "admin.use".to_string()),
            ("/admin ban <player>".to_string(), "admin.ban".to_string()),
            ("/admin ban <player>".to_string(), "admin.use".to_string()),
        ]
    );
}
