pub mod auth_service;
pub mod events;
pub mod geo;
pub mod lifecycle;
pub mod live_view;
pub mod matching;
pub mod notification_service;
pub mod request_service;
pub mod review_service;

pub use auth_service::AuthService;
pub use events::EventBus;
pub use lifecycle::TransitionPolicy;
pub use live_view::LiveView;
pub use matching::MatchingService;
pub use notification_service::{NotificationService, Notifier};
pub use request_service::{Actor, RequestService};
pub use review_service::ReviewService;
