//! Shared pieces of the API region failover functions: the weighted routing
//! model and its state classifier, plus the Route 53, SNS and HTTP adapters
//! the controllers are wired with.

pub mod config;
pub mod error;
pub mod notify;
pub mod probe;
pub mod response;
pub mod router;
pub mod state;

pub use config::RoutingConfig;
pub use error::{ConfigError, NotifyError, RoutingError};
pub use notify::{Notification, Notifier, SnsNotifier};
pub use probe::{HealthProber, HttpHealthProber};
pub use response::{ControllerResponse, ControllerStatus};
pub use router::{read_routing_pair, Route53Router, TrafficRouter};
pub use state::{
    RecordRole, RouteTarget, RoutingPair, RoutingRecord, RoutingState, TargetWeights, Transition,
    WeightBatch, WeightChange,
};

#[cfg(any(test, feature = "mocks"))]
pub use notify::MockNotifier;
#[cfg(any(test, feature = "mocks"))]
pub use probe::MockHealthProber;
#[cfg(any(test, feature = "mocks"))]
pub use router::MockTrafficRouter;
