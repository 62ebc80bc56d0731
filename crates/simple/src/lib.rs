//! Console host adapter.
//!
//! [`SimpleManager`] owns a [`CommandEngine`], installs plain-English
//! renderers for the reserved message keys, and handles line tokenization.
//! Everything else is delegated to the engine.

use std::sync::Arc;

use decli_core::engine::CommandEngine;
use decli_core::{ExecutionError, MessageContext, MessageKey, ParentDeclaration, RegistrationError};

/// Where rendered messages go. The REPL prints them; tests capture them.
pub type MessageSink<S> = Arc<dyn Fn(&S, &str) + Send + Sync>;

pub struct SimpleManager<S> {
    engine: CommandEngine<S>,
    sink: MessageSink<S>,
}

impl<S: 'static> SimpleManager<S> {
    pub fn new(sink: impl Fn(&S, &str) + Send + Sync + 'static) -> Self {
        let sink: MessageSink<S> = Arc::new(sink);
        let mut engine = CommandEngine::new();
        install_default_messages(&mut engine, &sink);
        Self { engine, sink }
    }

    pub fn engine(&self) -> &CommandEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut CommandEngine<S> {
        &mut self.engine
    }

    pub fn register(&mut self, declaration: ParentDeclaration<S>) -> Result<(), RegistrationError> {
        self.engine.register(declaration)
    }

    /// Sends free-form text through the manager's sink.
    pub fn reply(&self, sender: &S, message: &str) {
        (self.sink)(sender, message);
    }

    /// Tokenizes a line on whitespace and executes it.
    pub fn execute_line(&self, sender: &S, line: &str) -> Result<(), ExecutionError> {
        self.engine.execute(sender, &tokenize(line))
    }

    /// Completion candidates for a partial line. A trailing space starts a
    /// fresh empty token, so `"root "` suggests for the next position.
    pub fn suggest_line(&self, sender: &S, line: &str) -> Vec<String> {
        self.engine.suggest(sender, &tokenize_partial(line))
    }
}

fn install_default_messages<S: 'static>(engine: &mut CommandEngine<S>, sink: &MessageSink<S>) {
    let out = Arc::clone(sink);
    engine.register_message(MessageKey::UNKNOWN_COMMAND, move |sender, context| {
        if let MessageContext::InvalidCommand { command } = context {
            out(sender, &format!("Unknown command: `{command}`."));
        }
    });

    for key in [MessageKey::TOO_MANY_ARGUMENTS, MessageKey::NOT_ENOUGH_ARGUMENTS] {
        let out = Arc::clone(sink);
        engine.register_message(key, move |sender, context| {
            if let MessageContext::Syntax { command, syntax } = context {
                out(
                    sender,
                    &format!("Invalid usage of command `{command}`. Use: `{syntax}`."),
                );
            }
        });
    }

    let out = Arc::clone(sink);
    engine.register_message(MessageKey::INVALID_ARGUMENT, move |sender, context| {
        if let MessageContext::InvalidArgument {
            input,
            argument,
            argument_type,
            ..
        } = context
        {
            out(
                sender,
                &format!("Invalid argument `{input}` for `{argument}` (expected {argument_type})."),
            );
        }
    });
}

fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

fn tokenize_partial(line: &str) -> Vec<String> {
    let mut tokens = tokenize(line);
    if !line.is_empty() && line.ends_with(char::is_whitespace) {
        tokens.push(String::new());
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use decli_core::declare::{LeafDeclaration, ParameterDeclaration};
    use std::sync::Mutex;

    fn manager_with_log() -> (SimpleManager<()>, Arc<Mutex<Vec<String>>>) {
        let log: Arc<Mutex<Vec<String>>> = Arc::default();
        let sink = Arc::clone(&log);
        let manager = SimpleManager::new(move |_, message: &str| {
            sink.lock().unwrap().push(message.to_string());
        });
        (manager, log)
    }

    #[test]
    fn unknown_command_renders_default_text() {
        let (manager, log) = manager_with_log();

        manager.execute_line(&(), "nope").unwrap();
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["Unknown command: `nope`."]
        );
    }

    #[test]
    fn missing_argument_renders_the_syntax() {
        let (mut manager, log) = manager_with_log();
        manager
            .register(
                ParentDeclaration::new("give").leaf(
                    LeafDeclaration::new("item", |_, _| Ok(()))
                        .parameter(ParameterDeclaration::of::<String>("name")),
                ),
            )
            .unwrap();

        manager.execute_line(&(), "give item").unwrap();
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["Invalid usage of command `item`. Use: `/give item <name>`."]
        );
    }

    #[test]
    fn trailing_space_suggests_next_position() {
        let (mut manager, _) = manager_with_log();
        manager
            .register(
                ParentDeclaration::new("give")
                    .leaf(LeafDeclaration::new("item", |_, _| Ok(())))
                    .leaf(LeafDeclaration::new("iron", |_, _| Ok(()))),
            )
            .unwrap();

        let mut next = manager.suggest_line(&(), "give ");
        next.sort();
        assert_eq!(next, ["iron", "item"]);

        assert_eq!(manager.suggest_line(&(), "give it"), ["item"]);
        // An empty line lists the root commands themselves.
        assert_eq!(manager.suggest_line(&(), ""), ["give"]);
    }
}
