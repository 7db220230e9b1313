mod common;

mod classify_test;
mod delete_test;
mod quarantine_test;
mod scanner_test;
