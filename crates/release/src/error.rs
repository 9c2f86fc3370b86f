use std::borrow::Cow;

/// Errors produced by the release tooling.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// A process could not be spawned or a file could not be read.
    #[error("I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// Layered configuration could not be built or deserialized.
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    /// A package manifest is not valid TOML or lacks a `[package]` table.
    #[error("Manifest error{}: {source}", format_context(.context))]
    Manifest { source: toml::de::Error, context: Option<Cow<'static, str>> },

    /// Configuration values that parse but make no sense.
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The requested task name or alias is not registered.
    #[error("Unknown task '{name}'{}", format_context(.context))]
    UnknownTask { name: String, context: Option<Cow<'static, str>> },

    /// Task dependencies loop back on themselves.
    #[error("Task dependency cycle{}: {chain}", format_context(.context))]
    DependencyCycle { chain: String, context: Option<Cow<'static, str>> },

    /// A spawned command exited unsuccessfully.
    #[error("Command failed{}: `{command}` ended with {status}", format_context(.context))]
    CommandFailed { command: String, status: String, context: Option<Cow<'static, str>> },

    /// One or more publish targets failed after the whole list was attempted.
    #[error("Publish failed{}: {failed} of {total} targets failed", format_context(.context))]
    PublishFailed { failed: usize, total: usize, context: Option<Cow<'static, str>> },

    /// Internal logic errors.
    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Adds `.context(...)` to release results and to the upstream errors they wrap.
pub trait ReleaseErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T>;
}

impl<T> ReleaseErrorExt<T> for Result<T> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut err| {
            match &mut err {
                ReleaseError::Io { context: c, .. }
                | ReleaseError::Config { context: c, .. }
                | ReleaseError::Manifest { context: c, .. }
                | ReleaseError::InvalidConfiguration { context: c, .. }
                | ReleaseError::UnknownTask { context: c, .. }
                | ReleaseError::DependencyCycle { context: c, .. }
                | ReleaseError::CommandFailed { context: c, .. }
                | ReleaseError::PublishFailed { context: c, .. }
                | ReleaseError::Internal { context: c, .. } => *c = Some(context.into()),
            }
            err
        })
    }
}

impl<T> ReleaseErrorExt<T> for std::result::Result<T, std::io::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T> {
        self.map_err(|source| ReleaseError::Io { source, context: Some(context.into()) })
    }
}

impl<T> ReleaseErrorExt<T> for std::result::Result<T, config::ConfigError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T> {
        self.map_err(|source| ReleaseError::Config { source, context: Some(context.into()) })
    }
}

impl<T> ReleaseErrorExt<T> for std::result::Result<T, toml::de::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T> {
        self.map_err(|source| ReleaseError::Manifest { source, context: Some(context.into()) })
    }
}

impl From<std::io::Error> for ReleaseError {
    #[inline]
    fn from(source: std::io::Error) -> Self {
        Self::Io { source, context: None }
    }
}

impl From<config::ConfigError> for ReleaseError {
    #[inline]
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

impl From<toml::de::Error> for ReleaseError {
    #[inline]
    fn from(source: toml::de::Error) -> Self {
        Self::Manifest { source, context: None }
    }
}

impl From<&'static str> for ReleaseError {
    #[inline]
    fn from(message: &'static str) -> Self {
        Self::Internal { message: Cow::Borrowed(message), context: None }
    }
}

impl From<String> for ReleaseError {
    #[inline]
    fn from(message: String) -> Self {
        Self::Internal { message: Cow::Owned(message), context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
