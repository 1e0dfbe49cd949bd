// Concrete implementations of the order return service

pub mod http;

pub use http::HttpOrderReturnService;
