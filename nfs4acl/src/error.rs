use thiserror::Error;

#[derive(Error, Debug)]
pub enum AclError {
    #[error("Invalid ACE line '{0}': expected type:flags:principal:permissions")]
    Format(String),

    #[error("Unknown ACE type '{0}'")]
    UnknownKind(String),

    #[error("Cannot convert ACL as inheritance is not set for all special principals")]
    PartialInheritance,

    #[error("Cannot convert ACL as there are too many rules for principal {0}")]
    AmbiguousRules(String),

    #[error("Failed to run {tool}: {message}")]
    Tool { tool: &'static str, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AclError {
    /// True for the rule engine outcomes that mark an ACL as unsafe to
    /// migrate automatically, as opposed to collaborator failures.
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            AclError::PartialInheritance | AclError::AmbiguousRules(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AclError>;
