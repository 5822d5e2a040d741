//! Game settings: validation, form input handling, persistence

mod form;
mod manager;
mod validation;

pub use form::{SettingsForm, FORM_DEFAULT_LIFE, LIFE_INPUT_MAX_LEN, PLAYERS_INPUT_MAX_LEN};
pub use manager::SettingsManager;
pub use validation::{validate, FieldError, SettingsField, ValidationErrors};
