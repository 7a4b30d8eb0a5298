//! Lifecycle of a user-triggered backend call

/// State of one page action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionState {
    #[default]
    Idle,
    /// Request outstanding; the control is disabled
    Loading,
    Succeeded,
    /// Failed with the banner message shown to the user
    Failed(String),
}

impl ActionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, ActionState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ActionState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Settle a finished call, showing `message` on failure
    pub fn settle<T, E>(&mut self, result: &Result<T, E>, message: &str) {
        *self = match result {
            Ok(_) => ActionState::Succeeded,
            Err(_) => ActionState::Failed(message.to_string()),
        };
    }
}
