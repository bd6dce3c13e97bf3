use std::error::Error as StdError;

/// Crate-wide result type for bee operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared by factories, bees and the registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No factory is registered under this ID.
    #[error("unknown bee factory: {id}")]
    UnknownFactory { id: String },

    /// An action outside the bee's declared action set was dispatched.
    ///
    /// This is a contract violation between the hive and the bee, not a
    /// runtime condition; see [`Error::is_contract_violation`].
    #[error("unknown action triggered in {bee}: {action}")]
    UnknownAction { bee: String, action: String },

    /// The factory or bee does not implement the requested capability.
    #[error("not supported: {message}")]
    Unsupported { message: String },

    /// An option value could not be converted to the requested type.
    #[error("invalid option {name}: {message}")]
    InvalidOption { name: String, message: String },

    /// `run` was called a second time; a bee keeps its first event channel.
    #[error("bee {bee} is already running")]
    AlreadyRunning { bee: String },

    /// The bee tried to emit before `run` handed it an event channel.
    #[error("bee {bee} is not running")]
    NotRunning { bee: String },

    /// The hive dropped the receiving end of the event channel.
    #[error("event channel of bee {bee} is closed")]
    ChannelClosed { bee: String },

    #[error(transparent)]
    OAuth(#[from] hive_oauth::Error),

    /// Wrapped source error from an external service client.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn unknown_factory(id: impl std::fmt::Display) -> Self {
        Self::UnknownFactory { id: id.to_string() }
    }

    #[must_use]
    pub fn unknown_action(bee: impl std::fmt::Display, action: impl std::fmt::Display) -> Self {
        Self::UnknownAction {
            bee: bee.to_string(),
            action: action.to_string(),
        }
    }

    #[must_use]
    pub fn unsupported(message: impl std::fmt::Display) -> Self {
        Self::Unsupported {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_option(name: impl std::fmt::Display, message: impl std::fmt::Display) -> Self {
        Self::InvalidOption {
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn already_running(bee: impl std::fmt::Display) -> Self {
        Self::AlreadyRunning {
            bee: bee.to_string(),
        }
    }

    #[must_use]
    pub fn not_running(bee: impl std::fmt::Display) -> Self {
        Self::NotRunning {
            bee: bee.to_string(),
        }
    }

    #[must_use]
    pub fn channel_closed(bee: impl std::fmt::Display) -> Self {
        Self::ChannelClosed {
            bee: bee.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// True for errors that mean the hive and the bee disagree about the
    /// bee's contract. Callers must not retry these.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::UnknownAction { .. })
    }
}
