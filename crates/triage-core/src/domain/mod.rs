//! Domain model (rows, case record, lock state, evaluation, projections, ...).
//!
//! ここには I/O を持たない純粋な型と関数だけを置きます。
//! 時刻は引数で受け取り、永続化は app 層が行います。

pub mod case;
pub mod duration;
pub mod errors;
pub mod evaluation;
pub mod events;
pub mod expiry;
pub mod form;
pub mod ids;
pub mod layout;
pub mod priority;
pub mod state;
pub mod token;
pub mod treatment;

pub use case::CaseRecord;
pub use duration::{CellValue, fmt_hms, parse_epoch, parse_seconds};
pub use errors::{ErrorKind, TriageError};
pub use evaluation::{Evaluation, TimerWindow, evaluate, start_if_needed};
pub use events::DomainEvent;
pub use expiry::{ExpiryDecision, decide_expiry};
pub use form::{Field, FormMode, Projection, project};
pub use ids::{PageRow, SheetRow};
pub use layout::{Column, ColumnLayout};
pub use priority::Priority;
pub use state::LockState;
pub use token::{TokenClaims, TokenError};
pub use treatment::{TreatmentFlag, TreatmentFlags};
