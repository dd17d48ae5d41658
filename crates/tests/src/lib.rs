pub mod fixtures;

#[cfg(test)]
mod notification_tests;
