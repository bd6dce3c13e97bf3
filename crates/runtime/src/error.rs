pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no bee named {name} is running")]
    UnknownBee { name: String },

    #[error("a bee named {name} is already running")]
    DuplicateBee { name: String },

    #[error("bee {bee} is missing mandatory option {option}")]
    MissingOption { bee: String, option: String },

    #[error(transparent)]
    Bee(#[from] hive_bees::Error),
}

impl Error {
    #[must_use]
    pub fn unknown_bee(name: impl std::fmt::Display) -> Self {
        Self::UnknownBee {
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn duplicate_bee(name: impl std::fmt::Display) -> Self {
        Self::DuplicateBee {
            name: name.to_string(),
        }
    }

    /// True when a bee rejected an action it does not declare.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Bee(e) if e.is_contract_violation())
    }
}
