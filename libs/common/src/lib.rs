pub mod capability;
pub mod ids;
pub mod settings;
pub mod telemetry;
pub mod time;

pub use capability::{capability_for, Capability};
pub use ids::new_request_id;
pub use settings::CoreSettings;
pub use time::{deadline_from_now, now_utc};
