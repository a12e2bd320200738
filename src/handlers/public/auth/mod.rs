// Token acquisition. These routes sit outside the bearer gate.
pub mod login;
pub mod register;

pub use login::login_post;
pub use register::register_post;
