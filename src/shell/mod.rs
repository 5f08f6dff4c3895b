//! The administrative shell core
//!
//! A [`Session`] carries the connection, configuration, output formatter,
//! confirmer and audit sink. The [`CommandDispatcher`] resolves a command
//! name against the [`CommandRegistry`], runs it, and classifies failures
//! through the [`ErrorTranslator`].
//!
//! ```ignore
//! let mut session = Session::new(Arc::new(LocalCluster::new()));
//! let dispatcher = CommandDispatcher::default();
//! let result = dispatcher.run(&mut session, "list", &[])?;
//! ```

mod commands;
mod confirmation;
mod dispatcher;
mod errors;
mod format;
mod handlers;
mod session;
mod table;
mod translator;
mod types;

pub use commands::{Command, CommandGroup, CommandKind, CommandRegistry, COMMANDS};
pub use confirmation::{
    AssumeYes, ConfirmationRequest, Confirmer, ConsoleConfirmer, RecordingConfirmer,
};
pub use dispatcher::CommandDispatcher;
pub use errors::{EntityKind, ErrorClassification, ShellError, ShellResult};
pub use format::{escape_bytes, footer, unescape_bytes, Formatter, OutputBuffer};
pub use session::Session;
pub use table::TableRef;
pub use translator::ErrorTranslator;
pub use types::{CommandOutput, CommandResult};
