pub mod memory;
pub mod remote;
pub mod types;

pub use memory::MemoryTransport;
pub use remote::ReqwestTransport;
pub use types::{
    FilePart, Headers, HttpRequest, HttpResponse, MultipartForm, RequestBody, Transport,
    TransportError,
};

pub use http::{Method, StatusCode};
