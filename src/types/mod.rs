//! Public types for the Assistarr API.

mod media;
mod request;
mod service;
mod status;

pub use media::{MediaDetails, MediaItem, MediaStatus, MediaType, Section, SectionId};
pub use request::{
    ConnectionTest, LookupQuery, MediaRequestInput, RequestReceipt, RequestStatus,
    SeasonSelection, ServiceConfigInput, USER_HEADER,
};
pub use service::{API_KEY_MASK, AuthScheme, ServiceConfig, ServiceName, normalize_base_url};
pub use status::{MonitorSnapshot, PendingRequest, QueueItem, ServiceStatus, StalledItem};
