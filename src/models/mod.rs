pub mod event;
pub mod part;
pub mod review;
pub mod service_request;
pub mod technician;
pub mod user;

pub use event::*;
pub use part::*;
pub use review::*;
pub use service_request::*;
pub use technician::*;
pub use user::*;
