//! Accounts
//!
//! Sign-up, sign-in, session lookup and sign-out against the hosted
//! identity service, with the form checks that run before any call.

mod flow;
mod forms;
mod identity;

pub use flow::{AuthFlow, AuthFlowError, LOGGED_IN_MESSAGE, REGISTERED_MESSAGE};
pub use forms::{is_valid_email, LoginForm, RegistrationForm, ValidationError, MIN_PASSWORD_CHARS};
pub use identity::{
    AuthUser, GoTrueClient, IdentityError, IdentityProvider, IdentityResult, MemoryIdentity,
    Session,
};
