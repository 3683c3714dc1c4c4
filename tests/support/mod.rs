#![allow(dead_code)]

pub mod bundle;
pub mod catalog;
pub mod snapshot;
