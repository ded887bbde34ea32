use tower_sessions::Session;

use crate::error::{codes, ApiError};

/// Reads the authenticated account id the auth layer stored in the
/// session. This engine never authenticates anyone itself.
pub async fn current_account_id(session: &Session) -> Result<i32, ApiError> {
    match session.get::<i32>("account_id").await {
        Ok(Some(account_id)) => Ok(account_id),
        Ok(None) => Err(ApiError::Unauthorized(codes::ERR_NOT_AUTHENTICATED)),
        Err(e) => {
            log::error!("failed to read account_id from session: {}", e);
            Err(ApiError::Unauthorized(codes::ERR_NOT_AUTHENTICATED))
        }
    }
}
