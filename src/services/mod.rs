pub mod accounts;
pub mod documents;
pub mod reconcile;

pub use accounts::{AccountError, AccountService, Session};
pub use documents::{DocumentError, DocumentService, Upload};
pub use reconcile::{ReconcileError, ReconcileReport, Reconciler};
