mod plan;
mod preferences;
mod race;
mod race_tag;
mod training_plan;
mod user;

pub use plan::*;
pub use preferences::*;
pub use race::*;
pub use race_tag::*;
pub use training_plan::*;
pub use user::*;
