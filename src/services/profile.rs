use crate::{
    error::CoreError,
    models::{store::Store, user::User},
};

/// Store the profile captured by onboarding, replacing any previous one.
pub fn complete_onboarding(store: &mut Store, user: User) -> Result<&User, CoreError> {
    if user.name.trim().is_empty() {
        return Err(CoreError::Validation("Name cannot be empty".into()));
    }
    if !user.email.contains('@') {
        return Err(CoreError::Validation(format!(
            "'{}' is not a valid email address",
            user.email
        )));
    }

    tracing::info!(industry = %user.industry, "onboarding completed");

    Ok(store.user.insert(user))
}
