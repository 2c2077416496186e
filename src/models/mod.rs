pub mod user;
pub mod repository;
pub mod commit;
pub mod metrics;
pub mod profile;
pub mod directory;

pub use user::*;
pub use repository::*;
pub use commit::*;
pub use metrics::*;
pub use profile::*;
pub use directory::*;
