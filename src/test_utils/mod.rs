#![allow(missing_docs)]

pub(crate) mod app;
pub(crate) mod db;
pub(crate) mod http;

pub(crate) use app::{TEST_EMAIL, TEST_PASSWORD, TestApp};
pub(crate) use db::{create_test_user, get_test_connection, shared_connection};
pub(crate) use http::response_json;
