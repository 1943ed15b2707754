// Adapters layer: concrete implementations of the domain ports.

pub mod gemini;
pub mod local;
pub mod recaptcha;
pub mod supabase;

pub use gemini::GeminiGenerator;
pub use local::{InMemoryCardStore, InMemoryHistory, StaticIdentity};
pub use recaptcha::RecaptchaVerifier;
pub use supabase::SupabaseClient;
