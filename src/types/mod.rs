//! Request, response, and upload types.

pub mod request;
pub mod response;
pub mod signature;
pub mod upload;

pub use request::{
    DEFAULT_CACHE_TTL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, Method, RequestDescriptor,
    RequestOptions,
};
pub use response::ResponseBody;
pub use signature::RequestSignature;
pub use upload::{ProgressFn, UploadPayload};
