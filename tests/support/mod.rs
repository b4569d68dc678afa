#![allow(dead_code)]

pub mod adapter;
