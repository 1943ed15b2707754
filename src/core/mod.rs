pub mod catalog;
pub mod interpretation;
pub mod prompt;
pub mod quota;
pub mod service;

pub use crate::domain::model::{CardReading, ReadingRequest, ReadingResponse};
pub use crate::domain::ports::{
    CaptchaVerifier, CardStore, IdentityProvider, ReadingHistory, TextGenerator,
};
pub use crate::utils::error::Result;
