//! Out-of-office tracking: the interval store, the slash-command grammar, and
//! the optional text transformer used to embellish replies.

pub mod ai_client;
pub mod command;
pub mod error;
pub mod interval_store;
pub mod openai_client;
pub mod transformer;
pub mod types;

pub use command::{parse_command, DateRange};
pub use error::ParseError;
pub use interval_store::{IntervalStore, ORGANIZATION_TZ};
pub use transformer::{transform_or_original, HumorTransformer, Passthrough, TextTransformer};
pub use types::{render_digest, Absence, DATE_FORMAT, NOBODY_OUT};
