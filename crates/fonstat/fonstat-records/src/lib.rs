#![forbid(unsafe_code)]

pub mod site_record;
pub use site_record::{LinkStatus, SiteRecord, SITE_NAME_LEN};
