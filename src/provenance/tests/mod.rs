//! Reporter tests against the mock host

mod helpers;
