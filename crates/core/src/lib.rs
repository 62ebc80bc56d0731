//! Declarative command framework core.
//!
//! Commands are described as data ([`declare`]), validated and lowered into
//! an executable tree at registration time, then dispatched against a
//! tokenized input line. The core is platform-agnostic: it knows nothing
//! about terminals, chat windows, or permission systems beyond the seams in
//! [`sender`].
//!
//! The dispatch contract: user-input failures (unknown command, wrong
//! argument count, unresolvable value) are rendered through the message
//! registry and never become `Err`. Only two things fail loudly — invalid
//! command declarations at registration time, and errors returned by command
//! targets.

pub mod argument;
pub mod command;
pub mod declare;
pub mod engine;
pub mod error;
pub mod message;
pub mod meta;
pub mod registry;
pub mod requirement;
pub mod resolve;
pub mod sender;
pub mod suggestion;
pub mod value;

pub use argument::keyed::{ArgumentKey, Flag, FlagKey, KeyedArguments, NamedArg};
pub use declare::{
    CommandDeclaration, Invocation, LeafDeclaration, NamedInput, ParameterDeclaration,
    ParentDeclaration, RequirementDeclaration,
};
pub use engine::CommandEngine;
pub use error::{ExecutionError, RegistrationError};
pub use message::{MessageContext, MessageKey};
pub use requirement::RequirementKey;
pub use resolve::{InvalidArgument, Resolve};
pub use suggestion::{SuggestionKey, SuggestionMethod};
