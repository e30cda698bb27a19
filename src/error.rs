use crate::notice::Notice;

/// Failure reported by the remote data gateway.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("not found")] NotFound,
    #[error("conflict")] Conflict,
    #[error("unauthorized")] Unauthorized,
    #[error("rejected ({status}): {message}")] Rejected { status: u16, message: String },
    #[error("internal error: {0}")] Internal(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure of a user action. Every variant is recovered where the action was
/// issued and shown to the user as a notice.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("sign in required")] Unauthenticated,
    #[error("post has not been saved yet")] MissingIdentifier,
    #[error("not allowed")] Forbidden,
    #[error("{0}")] Validation(String),
    #[error("remote call failed: {0}")] Remote(#[from] GatewayError),
}

impl ActionError {
    pub fn notice(&self) -> Notice {
        match self {
            ActionError::Unauthenticated => Notice::error("Sign in required", "Please sign in to continue"),
            ActionError::MissingIdentifier => Notice::error("Error", "This post has not been saved yet"),
            ActionError::Forbidden => Notice::error("Error", "You can only edit your own profile"),
            ActionError::Validation(msg) => Notice::error("Error", msg.clone()),
            ActionError::Remote(GatewayError::Unauthorized) => Notice::error("Error", "Your session has expired, please sign in again"),
            ActionError::Remote(_) => Notice::error("Error", "Something went wrong, please try again"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeVariant;

    #[test]
    fn every_action_error_maps_to_destructive_notice() {
        let errs = [
            ActionError::Unauthenticated,
            ActionError::MissingIdentifier,
            ActionError::Forbidden,
            ActionError::Validation("Comment cannot be empty".into()),
            ActionError::Remote(GatewayError::Conflict),
        ];
        for e in errs {
            assert_eq!(e.notice().variant, NoticeVariant::Destructive);
        }
    }

    #[test]
    fn validation_message_is_shown_verbatim() {
        let n = ActionError::Validation("Comment cannot be empty".into()).notice();
        assert_eq!(n.description, "Comment cannot be empty");
    }
}
