pub mod auth;
pub mod documents;
pub mod forms;
pub mod generate;
pub mod viewer;

// Re-export the controllers so the binary and tests can wire them directly.
pub use auth::{AuthController, AuthState};
pub use documents::DocumentList;
pub use forms::{LoginPage, RegisterPage, RegistrationForm, RegistrationOutcome};
pub use generate::{GeneratePage, GenerationForm};
pub use viewer::{DocumentViewer, Export};
