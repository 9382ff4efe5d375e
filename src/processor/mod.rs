pub mod alert_engine;
pub mod format;
pub mod grouper;

#[cfg(test)]
pub mod testing;
