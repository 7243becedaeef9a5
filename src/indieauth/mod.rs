//! IndieAuth protocol pieces used by the token endpoint: endpoint discovery,
//! trust checks and authorization code verification.

pub mod discovery;
pub mod exchange;
pub mod fetch;
pub mod link_header;
pub mod markup;
pub mod trust;
pub mod uri;
pub mod validate;
