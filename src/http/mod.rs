//! HTTP scaffold shared by the catalog routes: router composition, server
//! bootstrap, the JSON response envelope, request logging, Basic auth and CORS.

pub(crate) mod app;
pub(crate) mod auth;
pub(crate) mod cors;
pub(crate) mod logging;
pub(crate) mod response;
pub(crate) mod server;
